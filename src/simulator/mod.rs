pub mod config;
pub mod driver;
pub mod mode;
pub mod shell;
pub mod simulator;
pub mod trace;
pub mod utils;
pub mod workload;

// provide to opal
pub use simulator::{Simulator, Verdict};
pub use utils::log;
