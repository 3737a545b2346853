//! Stage ALIGN_AND_COUNT: one partition from raw reads to metric records.

use crate::aligner::run_aligner;
use crate::counter::run_counter;
use crate::read_splitter::split_interleaved;
use crate::rna_qc::run_rna_qc;
use crate::scratch::ScratchDir;
use anyhow::{Context, Result};
use falco_types::{partition_prefix, MetricRecord, PipelineConfig, SampleId};
use itertools::Itertools;
use log::info;

const ALIGNER_OUTPUT_DIR: &str = "aligner_output";

/// One unit of input: a named read batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub content: String,
}

impl Partition {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Partition {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Name with path and extensions removed; unique per partition.
    pub fn prefix(&self) -> &str {
        partition_prefix(&self.name)
    }

    pub fn sample(&self) -> SampleId {
        SampleId::from_partition_name(&self.name)
    }
}

/// Everything a partition contributes to the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutput {
    pub partition: String,
    pub sample: SampleId,
    pub records: Vec<MetricRecord>,
    pub paired: bool,
    /// Reads (or read pairs) written to the FASTQ files.
    pub read_records: usize,
    pub skipped_lines: usize,
}

fn run_steps(config: &PipelineConfig, partition: &Partition, scratch: &ScratchDir) -> Result<PartitionOutput> {
    let prefix = partition.prefix();
    let sample = partition.sample();

    info!("Recreating FASTQ file(s) for {prefix}");
    let reads = split_interleaved(prefix, &partition.content, scratch.path())?;
    info!(
        "Recreating FASTQ file(s) complete. Files recreated: {}",
        reads.files.iter().map(|f| f.display()).join(",")
    );

    let out_dir = scratch.subdir(ALIGNER_OUTPUT_DIR)?;
    let alignment = run_aligner(config, &sample, &reads, &out_dir)?;
    let mut records = run_counter(config, &sample, &alignment.aligned_file, reads.paired, &out_dir)?;
    records.extend(alignment.records);
    if config.run_qc {
        records.extend(run_rna_qc(config, &sample, &alignment.aligned_file, &out_dir)?);
    }

    Ok(PartitionOutput {
        partition: partition.name.clone(),
        sample,
        records,
        paired: reads.paired,
        read_records: reads.records,
        skipped_lines: reads.skipped_lines,
    })
}

/// Split, align, count and optionally QC one partition.
///
/// The partition's scratch directory `<scratch>/alignment_<prefix>` is removed
/// before this returns, on success and on every error path. A partition
/// contributes either all of its records or none.
pub fn align_and_count(config: &PipelineConfig, partition: &Partition) -> Result<PartitionOutput> {
    let attempt = || -> Result<PartitionOutput> {
        let scratch = ScratchDir::acquire(
            config
                .scratch_folder
                .join(format!("alignment_{}", partition.prefix())),
        )?;
        run_steps(config, partition, &scratch)
    };
    attempt().with_context(|| format!("processing partition {}", partition.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{break_tool, fake_pipeline, paired_end_batch, single_end_batch, write_tool_script};
    use falco_types::{FailureKind, InvocationFailure, ParametersFile, ParseError, ToolInvocationError};
    use pretty_assertions::assert_eq;

    fn value(output: &PartitionOutput, key: &str) -> Option<i64> {
        output
            .records
            .iter()
            .find(|r| r.key.as_str() == key)
            .map(|r| r.value)
    }

    fn scratch_of(params: &ParametersFile, prefix: &str) -> std::path::PathBuf {
        params.scratch_folder.join(format!("alignment_{prefix}"))
    }

    #[test]
    fn test_star_feature_counts() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = fake_pipeline(root.path())?;
        let config = params.resolve()?;

        let output = align_and_count(&config, &Partition::new("/in/S1_part0.txt", single_end_batch(5)))?;
        assert_eq!(output.sample, SampleId::new("S1"));
        assert!(!output.paired);
        assert_eq!(output.read_records, 5);
        assert!(output.records.iter().all(|r| r.sample == output.sample));
        assert_eq!(value(&output, "G1"), Some(5));
        assert_eq!(value(&output, "G2"), Some(0));
        assert_eq!(value(&output, "QC_featureCount_assigned"), Some(5));
        assert_eq!(value(&output, "QC_STAR_Number_of_input_reads"), Some(5));
        assert_eq!(value(&output, "QC_STAR_Uniquely_mapped_reads_number"), Some(5));
        assert!(!scratch_of(&params, "S1_part0").exists());
        Ok(())
    }

    #[test]
    fn test_hisat_htseq_paired() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = ParametersFile {
            aligner: "hisat2".to_string(),
            counter: "htseq".to_string(),
            ..fake_pipeline(root.path())?
        };
        let config = params.resolve()?;

        let output = align_and_count(&config, &Partition::new("S2_part3.txt", paired_end_batch(4)))?;
        assert_eq!(output.sample, SampleId::new("S2"));
        assert!(output.paired);
        assert_eq!(value(&output, "G1"), Some(4));
        assert_eq!(value(&output, "QC_HTSeq_no_feature"), Some(2));
        assert_eq!(value(&output, "QC_HTSeq_ambiguous"), Some(0));
        assert_eq!(value(&output, "QC_HISAT_reads;_of_these"), Some(4));
        assert_eq!(value(&output, "QC_HISAT_aligned_0_times"), Some(4));
        assert!(!scratch_of(&params, "S2_part3").exists());
        Ok(())
    }

    #[test]
    fn test_run_qc() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = ParametersFile {
            run_qc: true,
            ..fake_pipeline(root.path())?
        };
        let output = align_and_count(&params.resolve()?, &Partition::new("S3.txt", single_end_batch(2)))?;
        assert_eq!(value(&output, "QC_picard_pf_bases"), Some(1000));
        assert_eq!(value(&output, "QC_picard_ribosomal_bases"), None);
        assert_eq!(
            output
                .records
                .iter()
                .filter(|r| r.key.as_str().starts_with("QC_picard_"))
                .count(),
            9
        );
        Ok(())
    }

    #[test]
    fn test_failing_aligner_cleans_up() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = fake_pipeline(root.path())?;
        break_tool(root.path(), "STAR")?;
        let config = params.resolve()?;

        let err = align_and_count(&config, &Partition::new("S1_part0.txt", single_end_batch(3))).unwrap_err();
        assert_eq!(FailureKind::of(&err), FailureKind::ToolInvocation);
        let tool_err = err.downcast_ref::<ToolInvocationError>().unwrap();
        assert_eq!(tool_err.tool, "STAR");
        assert_eq!(tool_err.reason, InvocationFailure::NonZeroExit(Some(104)));
        assert!(tool_err.stderr.contains("FATAL ERROR"));
        assert!(tool_err.stdout.contains("started STAR run"));
        assert!(format!("{err:#}").contains("processing partition S1_part0.txt"));
        assert!(!scratch_of(&params, "S1_part0").exists());
        Ok(())
    }

    #[test]
    fn test_counter_error_marker() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = fake_pipeline(root.path())?;
        write_tool_script(
            &root.path().join("tools"),
            "featureCounts",
            "echo 'ERROR: failed to find the gene identifier attribute' >&2\n",
        )?;
        let err = align_and_count(&params.resolve()?, &Partition::new("S4.txt", single_end_batch(1))).unwrap_err();
        let tool_err = err.downcast_ref::<ToolInvocationError>().unwrap();
        assert_eq!(tool_err.reason, InvocationFailure::ErrorMarker("error".to_string()));
        assert!(!scratch_of(&params, "S4").exists());
        Ok(())
    }

    #[test]
    fn test_missing_summary_is_parse_error() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = fake_pipeline(root.path())?;
        write_tool_script(
            &root.path().join("tools"),
            "featureCounts",
            r#"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf '# cmd\nGeneid\tLength\tcounts\nG1\t10\t3\n' > "$out"
"#,
        )?;
        let err = align_and_count(&params.resolve()?, &Partition::new("S5.txt", single_end_batch(1))).unwrap_err();
        assert_eq!(FailureKind::of(&err), FailureKind::Parse);
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Unreadable { tool: "featureCounts", .. })
        ));
        assert!(!scratch_of(&params, "S5").exists());
        Ok(())
    }

    #[test]
    fn test_existing_scratch_dir_is_reused() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = fake_pipeline(root.path())?;
        let stale = scratch_of(&params, "S6");
        std::fs::create_dir_all(stale.join(ALIGNER_OUTPUT_DIR))?;
        let output = align_and_count(&params.resolve()?, &Partition::new("S6.txt", single_end_batch(2)))?;
        assert_eq!(value(&output, "G1"), Some(2));
        assert!(!stale.exists());
        Ok(())
    }

    #[test]
    fn test_scratch_failure_names_partition() -> Result<()> {
        let root = tempfile::tempdir()?;
        let params = ParametersFile {
            scratch_folder: root.path().join("missing").join("scratch"),
            ..fake_pipeline(root.path())?
        };
        let err = align_and_count(&params.resolve()?, &Partition::new("/in/S7_part0.txt", single_end_batch(1)))
            .unwrap_err();
        assert_eq!(FailureKind::of(&err), FailureKind::Io);
        assert!(format!("{err:#}").contains("processing partition /in/S7_part0.txt"));
        Ok(())
    }
}
