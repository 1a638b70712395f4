pub mod container;
pub mod record;
pub mod samples;

pub use container::{ContainerKind, PcmPayload};
pub use record::BlockPower;
pub use samples::{encode_samples, SampleView};
