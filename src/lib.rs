pub mod builtin;
pub mod config;
pub mod frontend;
pub mod memdomain;
pub mod mmdomain;
pub mod simulator;
pub mod top;

pub use self::config::AccelConfig;
pub use simulator::Simulator;
pub use top::Accelerator;
