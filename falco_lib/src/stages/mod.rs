//! Pipeline stages

pub mod aggregate;
pub mod align_and_count;

pub use aggregate::{aggregate, run_summary};
pub use align_and_count::{align_and_count, Partition, PartitionOutput};
