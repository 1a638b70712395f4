pub mod stats;

pub use stats::{compute_rms_power, StatsHelper};
