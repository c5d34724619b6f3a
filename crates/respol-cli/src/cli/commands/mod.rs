//! CLI command handlers, one per file.

mod classify;
mod show;
mod simulate;
mod validate;

pub use classify::run_classify;
pub use show::run_show;
pub use simulate::run_simulate;
pub use validate::run_validate;
