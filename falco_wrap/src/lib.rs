// Warning groups
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

//! Command line front end of the falco pipeline.

use anyhow::Result;
use clap::Parser;
use falco_lib::{run_pipeline, JobOutputs};
use falco_types::ParametersFile;
use log::info;
use std::path::PathBuf;

pub mod utils;

/// Align and quantify RNA-seq reads, then build a gene expression matrix
/// and a QC report across samples.
#[derive(Parser, Debug)]
#[clap(name = "falco", version)]
pub struct Falco {
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Run the pipeline over a directory of interleaved read batches.
    #[clap(name = "run")]
    Run(Run),
}

/// Options of `falco run`. Every option except the paths and `--jobs`
/// overrides the matching value of the parameters file.
#[derive(Parser, Debug, Clone)]
pub struct Run {
    /// Directory holding one interleaved read batch per file.
    #[clap(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory for the expression matrix, QC report and run summary.
    #[clap(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Parameters file (TOML). Defaults are used when it is absent.
    #[clap(long, value_name = "TOML", default_value = "parameters.toml")]
    pub config: PathBuf,

    /// Aligner to use: STAR or HISAT2.
    #[clap(long, value_name = "NAME")]
    pub aligner: Option<String>,

    /// Counter to use: featureCounts or HTSeq.
    #[clap(long, value_name = "NAME")]
    pub counter: Option<String>,

    /// Annotation file name inside the reference's genome_ref folder.
    #[clap(long, value_name = "FILE")]
    pub annotation: Option<String>,

    /// NONE, FIRST_READ_TRANSCRIPTION_STRAND or SECOND_READ_TRANSCRIPTION_STRAND.
    #[clap(long, value_name = "STRAND")]
    pub strand_specificity: Option<String>,

    /// Collect alignment QC metrics with Picard tools.
    #[clap(long)]
    pub run_qc: bool,

    /// Extra arguments passed verbatim to the aligner.
    #[clap(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub aligner_extra_args: Option<String>,

    /// Extra arguments passed verbatim to the counter.
    #[clap(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub counter_extra_args: Option<String>,

    /// Extra arguments passed verbatim to the QC tool.
    #[clap(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub qc_extra_args: Option<String>,

    /// Parent folder of the per-partition scratch directories.
    #[clap(long, value_name = "PATH")]
    pub scratch: Option<PathBuf>,

    /// Partitions processed in parallel. Defaults to one per core.
    #[clap(long, value_name = "NUM", default_value_t = 0)]
    pub jobs: usize,

    /// Attempts per partition before the run fails.
    #[clap(long, value_name = "NUM")]
    pub attempts: Option<usize>,
}

impl Run {
    /// Load the parameters file and apply the command line overrides.
    pub fn parameters(&self) -> Result<ParametersFile> {
        let mut params = ParametersFile::load(&self.config)?;
        let overrides = [
            (&mut params.aligner, &self.aligner),
            (&mut params.counter, &self.counter),
            (&mut params.annotation_file, &self.annotation),
            (&mut params.strand_specificity, &self.strand_specificity),
            (&mut params.aligner_extra_args, &self.aligner_extra_args),
            (&mut params.counter_extra_args, &self.counter_extra_args),
            (&mut params.qc_extra_args, &self.qc_extra_args),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
        params.run_qc |= self.run_qc;
        if let Some(ref scratch) = self.scratch {
            params.scratch_folder.clone_from(scratch);
        }
        if let Some(attempts) = self.attempts {
            params.max_partition_attempts = attempts;
        }
        Ok(params)
    }

    pub fn execute(&self) -> Result<JobOutputs> {
        let config = self.parameters()?.resolve()?;
        let outputs = run_pipeline(&config, &self.input, &self.output, self.jobs)?;
        info!("Expression matrix: {}", outputs.expression.display());
        info!("QC report: {}", outputs.qc_report.display());
        Ok(outputs)
    }
}
