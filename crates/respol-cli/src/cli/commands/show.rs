//! Show command: print the effective policy table.

use anyhow::Result;
use respol_core::config::RespolConfig;

pub fn run_show(cfg: &RespolConfig) -> Result<()> {
    let registration = cfg.build_registry();
    println!(
        "{:<8} {:<26} {:>8} {:>12} {:>6}",
        "STATUS", "ACTION", "RETRIES", "BACKOFF_MS", "PASS"
    );
    for policy in registration.registry.iter() {
        let status = if policy.is_timeout_policy() {
            "timeout".to_string()
        } else {
            policy.status_code.to_string()
        };
        let retries = if policy.has_retry_limit() {
            policy.max_num_retries.to_string()
        } else {
            "-".to_string()
        };
        let backoff = if policy.action.is_backoff() {
            policy.backoff_interval_ms.to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:<8} {:<26} {:>8} {:>12} {:>6}",
            status, policy.action, retries, backoff, policy.pass_record
        );
    }
    println!();
    println!("stage error code: {}", cfg.stage_error_code);
    let markers = &cfg.timeout_markers;
    println!("timeout markers (priority order):");
    for (timeout_type, texts) in markers.in_priority_order() {
        println!("  {:<10} {:?}", timeout_type, texts);
    }
    if !registration.is_valid() {
        println!();
        println!("{} issue(s); run `respol validate` for details", registration.issues.len());
    }
    Ok(())
}
