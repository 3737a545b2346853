//! Gene quantification with featureCounts or htseq-count.

use crate::parsers::{parse_feature_counts, parse_feature_counts_summary, parse_htseq};
use crate::tools::{read_output, run_checked, CommandLine, ErrorMarker, SuccessRule};
use anyhow::Result;
use falco_types::{CounterKind, MetricRecord, PipelineConfig, SampleId};
use log::info;
use std::path::Path;

const FEATURE_COUNTS_TABLE: &str = "counts.txt";
const FEATURE_COUNTS_MARKERS: &[ErrorMarker] = &[
    ErrorMarker::Literal("[Errno"),
    ErrorMarker::CaseInsensitive("error"),
];
const HTSEQ_MARKERS: &[ErrorMarker] = &[ErrorMarker::Literal("[Errno")];

pub(crate) fn feature_counts_command(
    config: &PipelineConfig,
    aligned: &Path,
    paired: bool,
    out_dir: &Path,
) -> CommandLine {
    let cmd = CommandLine::new(&config.tools.feature_counts);
    let cmd = if paired { cmd.arg("-p") } else { cmd };
    cmd.arg("-T")
        .arg(config.threads.to_string())
        .raw(&config.counter_extra_args)
        .arg("-a")
        .path(&config.annotation_path())
        .arg("-o")
        .path(&out_dir.join(FEATURE_COUNTS_TABLE))
        .path(aligned)
}

pub(crate) fn htseq_command(config: &PipelineConfig, aligned: &Path) -> CommandLine {
    let format = aligned
        .extension()
        .map_or_else(|| "sam".into(), |ext| ext.to_string_lossy());
    CommandLine::new(&config.tools.htseq_count)
        .arg("-f")
        .arg(format)
        .raw(&config.counter_extra_args)
        .path(aligned)
        .path(&config.annotation_path())
}

fn count_feature_counts(
    config: &PipelineConfig,
    sample: &SampleId,
    aligned: &Path,
    paired: bool,
    out_dir: &Path,
) -> Result<Vec<MetricRecord>> {
    let table = out_dir.join(FEATURE_COUNTS_TABLE);
    let rule = SuccessRule {
        check_exit: true,
        error_markers: FEATURE_COUNTS_MARKERS,
        required_output: Some(table.clone()),
        ..SuccessRule::default()
    };
    let cmd = feature_counts_command(config, aligned, paired, out_dir);
    run_checked("featureCounts", &cmd, &rule)?;

    let mut records = parse_feature_counts(sample, &read_output("featureCounts", &table)?)?;
    let summary = table.with_extension("txt.summary");
    records.extend(parse_feature_counts_summary(
        sample,
        &read_output("featureCounts", &summary)?,
    )?);
    Ok(records)
}

fn count_htseq(config: &PipelineConfig, sample: &SampleId, aligned: &Path) -> Result<Vec<MetricRecord>> {
    let rule = SuccessRule {
        check_exit: true,
        error_markers: HTSEQ_MARKERS,
        ..SuccessRule::default()
    };
    let invocation = run_checked("HTSeq", &htseq_command(config, aligned), &rule)?;
    Ok(parse_htseq(sample, &invocation.stdout)?)
}

/// Count reads per gene in `aligned` with the configured counter. The result
/// holds gene records followed by the counter's QC records.
pub fn run_counter(
    config: &PipelineConfig,
    sample: &SampleId,
    aligned: &Path,
    paired: bool,
    out_dir: &Path,
) -> Result<Vec<MetricRecord>> {
    info!("Counting reads with {}", config.counter);
    let records = match config.counter {
        CounterKind::FeatureCounts => count_feature_counts(config, sample, aligned, paired, out_dir)?,
        CounterKind::HtSeq => count_htseq(config, sample, aligned)?,
    };
    info!("Completed read counting");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use falco_types::ParametersFile;
    use pretty_assertions::assert_eq;

    fn config() -> PipelineConfig {
        ParametersFile {
            annotation_file: "genes.gtf".to_string(),
            counter_extra_args: "-s 1".to_string(),
            ..ParametersFile::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn test_feature_counts_command() {
        let aligned = Path::new("/s/aligner_output/Aligned.out.sam");
        let out = Path::new("/s/aligner_output");
        assert_eq!(
            feature_counts_command(&config(), aligned, true, out).render(),
            "/mnt/app/subread/featureCounts -p -T 4 -s 1 -a /mnt/ref/genome_ref/genes.gtf \
             -o /s/aligner_output/counts.txt /s/aligner_output/Aligned.out.sam"
        );
        assert_eq!(
            feature_counts_command(&config(), aligned, false, out).render(),
            "/mnt/app/subread/featureCounts -T 4 -s 1 -a /mnt/ref/genome_ref/genes.gtf \
             -o /s/aligner_output/counts.txt /s/aligner_output/Aligned.out.sam"
        );
    }

    #[test]
    fn test_htseq_command() {
        let aligned = Path::new("/s/aligner_output/output.sam");
        assert_eq!(
            htseq_command(&config(), aligned).render(),
            "htseq-count -f sam -s 1 /s/aligner_output/output.sam /mnt/ref/genome_ref/genes.gtf"
        );
    }

    #[test]
    fn test_summary_path() {
        let table = Path::new("/s/counts.txt");
        assert_eq!(
            table.with_extension("txt.summary"),
            Path::new("/s/counts.txt.summary")
        );
    }
}
