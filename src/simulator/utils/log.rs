/// Logger initialization
use env_logger::{Builder, Env};

/// Initialize env_logger once. Respects RUST_LOG, defaults to info.
/// Timestamps are dropped since simulation time is carried in the messages.
pub fn init_log() {
  let env = Env::default().default_filter_or("info");
  let _ = Builder::from_env(env).format_timestamp(None).try_init();
}

/// Print a log message with blue [Opal] prefix
#[macro_export]
macro_rules! log_info {
  ($($arg:tt)*) => {
    println!("\x1b[34m[Opal]\x1b[0m {}", format!($($arg)*));
  };
}
