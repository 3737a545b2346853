//! Read alignment with STAR or HISAT2.

use crate::parsers::{parse_hisat_stderr, parse_star_log};
use crate::read_splitter::SplitReads;
use crate::tools::{read_output, run_checked, CommandLine, SuccessRule};
use anyhow::Result;
use falco_types::{AlignerKind, MetricRecord, PipelineConfig, SampleId};
use log::info;
use std::path::{Path, PathBuf};

const STAR_LOG: &str = "Log.final.out";
const STAR_ALIGNMENT: &str = "Aligned.out.sam";
const HISAT_ALIGNMENT: &str = "output.sam";

/// The output of the alignment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub aligned_file: PathBuf,
    /// QC records parsed from the aligner's report.
    pub records: Vec<MetricRecord>,
}

pub(crate) fn star_command(config: &PipelineConfig, reads: &SplitReads, out_dir: &Path) -> CommandLine {
    let cmd = CommandLine::new(&config.tools.star)
        .arg("--runThreadN")
        .arg(config.threads.to_string())
        .raw(&config.aligner_extra_args)
        .arg("--genomeDir")
        .path(&config.star_index())
        .arg("--readFilesIn");
    reads
        .files
        .iter()
        .fold(cmd, |cmd, file| cmd.path(file))
        .arg("--outFileNamePrefix")
        .arg(format!("{}/", out_dir.display()))
}

pub(crate) fn hisat_command(config: &PipelineConfig, reads: &SplitReads, out_dir: &Path) -> CommandLine {
    let cmd = CommandLine::new(&config.tools.hisat2)
        .arg("-p")
        .arg(config.threads.to_string())
        .arg("--tmo")
        .raw(&config.aligner_extra_args)
        .arg("-x")
        .path(&config.hisat_index());
    let cmd = match reads.files.as_slice() {
        [mate1, mate2] => cmd.arg("-1").path(mate1).arg("-2").path(mate2),
        files => files.iter().fold(cmd.arg("-U"), |cmd, file| cmd.path(file)),
    };
    cmd.arg("-S").path(&out_dir.join(HISAT_ALIGNMENT))
}

fn align_star(
    config: &PipelineConfig,
    sample: &SampleId,
    reads: &SplitReads,
    out_dir: &Path,
) -> Result<Alignment> {
    let log_file = out_dir.join(STAR_LOG);
    let rule = SuccessRule {
        check_exit: true,
        empty_stderr: true,
        required_output: Some(log_file.clone()),
        ..SuccessRule::default()
    };
    run_checked("STAR", &star_command(config, reads, out_dir), &rule)?;
    let records = parse_star_log(sample, &read_output("STAR", &log_file)?)?;
    Ok(Alignment {
        aligned_file: out_dir.join(STAR_ALIGNMENT),
        records,
    })
}

fn align_hisat(
    config: &PipelineConfig,
    sample: &SampleId,
    reads: &SplitReads,
    out_dir: &Path,
) -> Result<Alignment> {
    let rule = SuccessRule {
        check_exit: true,
        ..SuccessRule::default()
    };
    let invocation = run_checked("HISAT2", &hisat_command(config, reads, out_dir), &rule)?;
    let records = parse_hisat_stderr(sample, &invocation.stderr)?;
    Ok(Alignment {
        aligned_file: out_dir.join(HISAT_ALIGNMENT),
        records,
    })
}

/// Align `reads` with the configured aligner, writing into `out_dir`.
pub fn run_aligner(
    config: &PipelineConfig,
    sample: &SampleId,
    reads: &SplitReads,
    out_dir: &Path,
) -> Result<Alignment> {
    info!("Aligning reads with {}", config.aligner);
    let alignment = match config.aligner {
        AlignerKind::Star => align_star(config, sample, reads, out_dir)?,
        AlignerKind::Hisat2 => align_hisat(config, sample, reads, out_dir)?,
    };
    info!("Completed reads alignment");
    Ok(alignment)
}
