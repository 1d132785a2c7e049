pub mod log;
pub mod log_config;
pub mod report;
