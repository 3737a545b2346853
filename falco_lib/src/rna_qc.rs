//! Optional alignment QC with Picard CollectRnaSeqMetrics.

use crate::parsers::parse_picard_metrics;
use crate::tools::{read_output, run_checked, CommandLine, SuccessRule};
use anyhow::Result;
use falco_types::{MetricRecord, PipelineConfig, QcToolKind, SampleId};
use log::info;
use std::path::Path;

const METRICS_FILE: &str = "output.RNA_Metrics";

pub(crate) fn picard_command(config: &PipelineConfig, aligned: &Path, out_dir: &Path) -> CommandLine {
    CommandLine::new(&config.tools.picard)
        .arg("CollectRnaSeqMetrics")
        .assign("I", aligned)
        .assign("O", &out_dir.join(METRICS_FILE))
        .assign("REF_FLAT", &config.ref_flat_path())
        .arg(format!("STRAND={}", config.strand_specificity))
        .raw(&config.qc_extra_args)
}

/// Collect RNA-seq alignment metrics for `aligned`. Only the presence of the
/// metrics file decides success; the exit code is not checked.
pub fn run_rna_qc(
    config: &PipelineConfig,
    sample: &SampleId,
    aligned: &Path,
    out_dir: &Path,
) -> Result<Vec<MetricRecord>> {
    let tool = QcToolKind::Picard;
    info!("Getting alignment metrics with {tool}");
    let metrics = out_dir.join(METRICS_FILE);
    let rule = SuccessRule {
        required_output: Some(metrics.clone()),
        ..SuccessRule::default()
    };
    run_checked("Picard tools", &picard_command(config, aligned, out_dir), &rule)?;
    let records = parse_picard_metrics(sample, &read_output("Picard tools", &metrics)?)?;
    info!("Completed alignment metrics");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use falco_types::ParametersFile;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_picard_command() {
        let config = ParametersFile {
            annotation_file: "genes.gtf".to_string(),
            strand_specificity: "second_read_transcription_strand".to_string(),
            qc_extra_args: "VALIDATION_STRINGENCY=LENIENT".to_string(),
            ..ParametersFile::default()
        }
        .resolve()
        .unwrap();
        let cmd = picard_command(
            &config,
            Path::new("/s/aligner_output/Aligned.out.sam"),
            Path::new("/s/aligner_output"),
        );
        assert_eq!(
            cmd.render(),
            "java8 -jar /mnt/app/picard-tools/picard.jar CollectRnaSeqMetrics \
             I=/s/aligner_output/Aligned.out.sam O=/s/aligner_output/output.RNA_Metrics \
             REF_FLAT=/mnt/ref/genome_ref/refFlat.txt STRAND=SECOND_READ_TRANSCRIPTION_STRAND \
             VALIDATION_STRINGENCY=LENIENT"
        );
    }
}
