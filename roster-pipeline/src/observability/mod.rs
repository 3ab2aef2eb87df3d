pub mod logging;
pub mod run_log;
