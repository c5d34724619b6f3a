//! Validate command: register the configured policies and report issues.

use anyhow::{bail, Result};
use respol_core::config::RespolConfig;

pub fn run_validate(cfg: &RespolConfig) -> Result<()> {
    let registration = cfg.build_registry();
    if registration.is_valid() {
        println!(
            "ok: {} response action(s) in {}",
            registration.registry.len(),
            registration.registry.config_name()
        );
        return Ok(());
    }
    for issue in &registration.issues {
        println!("{}", issue);
    }
    bail!("{} configuration issue(s) found", registration.issues.len());
}
