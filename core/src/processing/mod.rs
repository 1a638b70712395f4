pub mod assembler;
pub mod buffer_pool;
pub mod meter;
pub mod queue;

pub use assembler::BlockAssembler;
pub use buffer_pool::BufferPool;
pub use meter::PowerStage;
pub use queue::{PlaybackQueue, QueueEvent};
