// Warning groups
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

//! Shared vocabulary for the falco RNA-seq pipeline: sample identity,
//! metric records, tool choices, configuration, and the error taxonomy.

pub mod config;
pub mod errors;
pub mod record;
pub mod sample;
pub mod tools;

pub use config::{ParametersFile, PipelineConfig, ToolPaths};
pub use errors::{ConfigurationError, FailureKind, InvocationFailure, ParseError, ToolInvocationError};
pub use record::{MetricKey, MetricRecord, QC_PREFIX};
pub use sample::{partition_prefix, SampleId};
pub use tools::{AlignerKind, CounterKind, QcToolKind, StrandSpecificity};
