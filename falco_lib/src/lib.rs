// Warning groups
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

//! Core of the falco RNA-seq pipeline.
//!
//! A partition's reads are split into FASTQ files, aligned, counted and
//! optionally QC'd by external tools whose text output is parsed into metric
//! records. Records from every partition are then aggregated into a sparse
//! gene-by-sample expression matrix and a QC report.

pub mod aligner;
pub mod counter;
pub mod engine;
pub mod matrix;
pub mod parsers;
pub mod read_splitter;
pub mod rna_qc;
pub mod scratch;
pub mod stages;
pub mod testing;
pub mod tools;

pub use engine::{read_partitions, run_partitions, run_pipeline, JobOutputs};
pub use matrix::{CountMatrix, Reports};
pub use read_splitter::{split_interleaved, SplitReads};
pub use stages::{Partition, PartitionOutput};
