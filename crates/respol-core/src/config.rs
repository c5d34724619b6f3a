use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::action::ResponseAction;
use crate::attempt::StageContext;
use crate::control::Sleeper;
use crate::engine::{ResponseActionEngine, DEFAULT_STAGE_ERROR_CODE};
use crate::policy::{default_backoff_interval_ms, default_max_num_retries, ResponseActionPolicy};
use crate::registry::{Registration, StatusActionRegistry};
use crate::timeout::{TimeoutClassifier, TimeoutMarkers};

fn default_config_name() -> String {
    "responseStatusActionConfigs".to_string()
}

fn default_stage_error_code() -> String {
    DEFAULT_STAGE_ERROR_CODE.to_string()
}

/// Action taken on any classified timeout (`[timeout_action]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutActionConfig {
    pub action: ResponseAction,
    #[serde(default = "default_max_num_retries")]
    pub max_num_retries: i32,
    #[serde(default = "default_backoff_interval_ms")]
    pub backoff_interval_ms: i64,
    #[serde(default)]
    pub pass_record: bool,
}

impl TimeoutActionConfig {
    pub fn to_policy(&self) -> ResponseActionPolicy {
        ResponseActionPolicy::for_timeout(self.action)
            .with_max_retries(self.max_num_retries)
            .with_backoff_ms(self.backoff_interval_ms)
            .with_pass_record(self.pass_record)
    }
}

impl Default for TimeoutActionConfig {
    fn default() -> Self {
        Self {
            action: ResponseAction::RetryImmediate,
            max_num_retries: default_max_num_retries(),
            backoff_interval_ms: default_backoff_interval_ms(),
            pass_record: false,
        }
    }
}

/// Stage response-action configuration loaded from `~/.config/respol/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespolConfig {
    /// Config field name reported with validation issues.
    #[serde(default = "default_config_name")]
    pub config_name: String,
    /// Error code carried by `STAGE_ERROR` aborts.
    #[serde(default = "default_stage_error_code")]
    pub stage_error_code: String,
    /// Per-status policies, registered in order.
    #[serde(default)]
    pub actions: Vec<ResponseActionPolicy>,
    /// Optional timeout policy; if missing, timeouts are left to the stage.
    #[serde(default)]
    pub timeout_action: Option<TimeoutActionConfig>,
    #[serde(default)]
    pub timeout_markers: TimeoutMarkers,
}

impl Default for RespolConfig {
    fn default() -> Self {
        Self {
            config_name: default_config_name(),
            stage_error_code: default_stage_error_code(),
            actions: vec![
                ResponseActionPolicy::new(500, ResponseAction::RetryExponentialBackoff)
                    .with_backoff_ms(1000)
                    .with_max_retries(10),
            ],
            timeout_action: Some(TimeoutActionConfig::default()),
            timeout_markers: TimeoutMarkers::default(),
        }
    }
}

impl RespolConfig {
    /// Register all policies; issues are returned, not raised.
    pub fn build_registry(&self) -> Registration {
        let timeout = self.timeout_action.as_ref().map(TimeoutActionConfig::to_policy);
        StatusActionRegistry::build(self.config_name.clone(), &self.actions, timeout.as_ref())
    }

    pub fn classifier(&self) -> TimeoutClassifier {
        TimeoutClassifier::new(self.timeout_markers.clone())
    }

    pub fn engine<S: Sleeper>(&self, sleeper: S) -> ResponseActionEngine<S> {
        ResponseActionEngine::new(sleeper).with_stage_error_code(self.stage_error_code.clone())
    }

    /// Everything a stage needs; fails if the policy set has issues.
    pub fn stage_context<S: Sleeper>(&self, sleeper: S) -> Result<StageContext<S>> {
        let registry = self
            .build_registry()
            .into_result()
            .context("invalid response action configuration")?;
        Ok(StageContext::new(
            self.engine(sleeper),
            registry,
            self.classifier(),
        ))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("respol")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<RespolConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: RespolConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RespolConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RespolConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}
