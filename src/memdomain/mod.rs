pub mod channel;
pub mod dram;
pub mod memdomain;
pub mod prefetch;
pub mod router;
pub mod slot;
pub mod tag;

pub use channel::{MemReq, MemResp, OperandMemory};
pub use dram::Dram;
pub use memdomain::MemDomain;
pub use prefetch::PrefetchUnit;
pub use router::ResponseRouter;
pub use slot::{Slot, SlotPool};
pub use tag::{OperandHalf, Tag, TagQueue};
