pub mod module;
pub mod port;
pub mod record;

pub use module::Module;
pub use port::Wire;
pub use record::TraceRecord;
