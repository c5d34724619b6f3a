//! Classify command: run a timeout message through the classifier.

use anyhow::Result;
use respol_core::attempt::AttemptError;
use respol_core::config::RespolConfig;
use respol_core::timeout::{SocketTimeout, TimeoutError};
use std::error::Error;

/// Build the error a transport would raise for `message`.
pub fn build_error(message: &str, wrapped: bool, pipeline: bool) -> Box<dyn Error + Send + Sync> {
    let timeout: Box<dyn Error + Send + Sync> = if pipeline {
        Box::new(TimeoutError::new(message))
    } else {
        Box::new(SocketTimeout::new(message))
    };
    if wrapped {
        Box::new(AttemptError::Transport(timeout))
    } else {
        timeout
    }
}

pub fn run_classify(cfg: &RespolConfig, message: &str, wrapped: bool, pipeline: bool) -> Result<()> {
    let err = build_error(message, wrapped, pipeline);
    let timeout_type = cfg.classifier().classify(&*err);
    println!("{}", timeout_type);
    Ok(())
}
