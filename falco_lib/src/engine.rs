//! Local partition engine.
//!
//! Each regular file of an input directory is one partition. Partitions run
//! data-parallel on a rayon pool; a failed partition is retried up to the
//! configured number of attempts and the job fails as a whole if any
//! partition still fails. Aggregation starts only after every partition has
//! finished.

use crate::matrix::Reports;
use crate::stages::{aggregate, align_and_count, run_summary, Partition, PartitionOutput};
use anyhow::{bail, Context, Result};
use falco_types::{FailureKind, PipelineConfig};
use itertools::Itertools;
use log::{error, info, warn};
use metric::{JsonReport, JsonReporter};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Read every regular file in `input_dir` as one partition, sorted by name.
///
/// Hidden files and files starting with `_` (such as `_SUCCESS` markers) are
/// not partitions.
pub fn read_partitions(input_dir: &Path) -> Result<Vec<Partition>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(input_dir).with_context(|| input_dir.display().to_string())? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') || !entry.file_type()?.is_file() {
            continue;
        }
        paths.push(entry.path());
    }
    paths.sort();
    if paths.is_empty() {
        bail!("no input partitions found in {}", input_dir.display());
    }

    let partitions: Vec<Partition> = paths
        .iter()
        .map(|path| -> Result<Partition> {
            let content = fs::read_to_string(path).with_context(|| path.display().to_string())?;
            Ok(Partition::new(path.display().to_string(), content))
        })
        .collect::<Result<_>>()?;

    // Scratch directories are named after the prefix.
    if let Some((prefix, clashing)) = partitions
        .iter()
        .into_group_map_by(|p| p.prefix())
        .into_iter()
        .find(|(_, group)| group.len() > 1)
    {
        bail!(
            "input files {} share the partition name {prefix}",
            clashing.iter().map(|p| &p.name).join(", ")
        );
    }
    Ok(partitions)
}

fn run_with_retries(config: &PipelineConfig, partition: &Partition) -> Result<PartitionOutput> {
    let mut attempt = 1;
    loop {
        match align_and_count(config, partition) {
            Ok(output) => {
                info!(
                    "partition {} completed with {} records",
                    partition.name,
                    output.records.len()
                );
                return Ok(output);
            }
            Err(err) => {
                let kind = FailureKind::of(&err);
                if !kind.is_retryable() || attempt >= config.max_partition_attempts {
                    error!(
                        "partition {} failed after {attempt} attempt(s) ({kind:?})",
                        partition.name
                    );
                    return Err(err);
                }
                warn!(
                    "attempt {attempt} of partition {} failed ({kind:?}), retrying: {err:#}",
                    partition.name
                );
                attempt += 1;
            }
        }
    }
}

/// Process `partitions` on `jobs` threads, or one per core when `jobs` is 0.
/// All-or-nothing: any partition that fails after its retries fails the job.
pub fn run_partitions(
    config: &PipelineConfig,
    partitions: &[Partition],
    jobs: usize,
) -> Result<Vec<PartitionOutput>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    info!(
        "processing {} partition(s) on {} thread(s)",
        partitions.len(),
        pool.current_num_threads()
    );
    pool.install(|| {
        partitions
            .par_iter()
            .map(|partition| run_with_retries(config, partition))
            .collect()
    })
}

/// Paths of everything a job writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutputs {
    pub expression: PathBuf,
    pub qc_report: PathBuf,
    pub run_summary: PathBuf,
    pub summary: JsonReporter,
}

/// Run the whole job: read partitions, process them, aggregate, and write
/// the expression matrix, QC report and run summary into `output_dir`.
pub fn run_pipeline(
    config: &PipelineConfig,
    input_dir: &Path,
    output_dir: &Path,
    jobs: usize,
) -> Result<JobOutputs> {
    let partitions = read_partitions(input_dir)?;
    let outputs = run_partitions(config, &partitions, jobs)?;

    let reports: Reports = aggregate(&outputs)
        .context("aggregating partition records")?
        .split_reports();
    fs::create_dir_all(output_dir).with_context(|| output_dir.display().to_string())?;
    let (expression, qc_report) = reports.write(output_dir)?;

    let summary = run_summary(&outputs, &reports);
    let run_summary = output_dir.join(RUN_SUMMARY_FILE);
    summary.report(&run_summary)?;
    info!(
        "wrote {} expression row(s) and {} QC row(s) to {}",
        reports.expression.len(),
        reports.qc.len(),
        output_dir.display()
    );

    Ok(JobOutputs {
        expression,
        qc_report,
        run_summary,
        summary,
    })
}
