pub mod cmd;
pub mod regs;

pub use cmd::{CmdQueue, Command, FetchMode, QueueFull};
pub use regs::ShadowRegs;
