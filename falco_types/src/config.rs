//! Pipeline configuration.
//!
//! A `parameters.toml` file is deserialized into [`ParametersFile`], where every
//! field has a default and tool choices are still plain strings. Resolving it
//! produces the immutable [`PipelineConfig`] handed to every stage.

use crate::errors::ConfigurationError;
use crate::tools::{resolve_choice, AlignerKind, CounterKind, StrandSpecificity};
use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_APP_FOLDER: &str = "/mnt/app";
const DEFAULT_REFERENCE_FOLDER: &str = "/mnt/ref";
const DEFAULT_SCRATCH_FOLDER: &str = "/mnt/output";
const DEFAULT_THREADS: usize = 4;

/// Optional per-tool command prefixes. Each value is inserted verbatim at the
/// start of that tool's command line.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolOverrides {
    pub star: Option<String>,
    pub hisat2: Option<String>,
    pub feature_counts: Option<String>,
    pub htseq_count: Option<String>,
    pub picard: Option<String>,
}

/// The contents of a parameters file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ParametersFile {
    /// Aligner name: STAR or HISAT2.
    pub aligner: String,
    /// Counter name: featureCounts or HTSeq.
    pub counter: String,
    /// Substitute the default tool for an unrecognized name instead of failing.
    pub lenient_tool_selection: bool,
    pub aligner_extra_args: String,
    pub counter_extra_args: String,
    pub qc_extra_args: String,
    /// NONE, FIRST_READ_TRANSCRIPTION_STRAND or SECOND_READ_TRANSCRIPTION_STRAND.
    pub strand_specificity: String,
    /// Annotation file name inside `<reference_folder>/genome_ref`.
    pub annotation_file: String,
    /// Run the alignment QC tool after counting.
    pub run_qc: bool,
    /// Thread count passed to the aligner and counter.
    pub threads: usize,
    pub app_folder: PathBuf,
    pub reference_folder: PathBuf,
    /// Parent folder of the per-partition scratch directories.
    pub scratch_folder: PathBuf,
    /// Attempts per partition before the job fails.
    pub max_partition_attempts: usize,
    pub tools: ToolOverrides,
}

impl Default for ParametersFile {
    fn default() -> Self {
        ParametersFile {
            aligner: AlignerKind::default().to_string(),
            counter: CounterKind::default().to_string(),
            lenient_tool_selection: false,
            aligner_extra_args: String::new(),
            counter_extra_args: String::new(),
            qc_extra_args: String::new(),
            strand_specificity: StrandSpecificity::default().to_string(),
            annotation_file: String::new(),
            run_qc: false,
            threads: DEFAULT_THREADS,
            app_folder: PathBuf::from(DEFAULT_APP_FOLDER),
            reference_folder: PathBuf::from(DEFAULT_REFERENCE_FOLDER),
            scratch_folder: PathBuf::from(DEFAULT_SCRATCH_FOLDER),
            max_partition_attempts: 1,
            tools: ToolOverrides::default(),
        }
    }
}

macro_rules! warn_non_default {
    ($params:ident, $defaults:ident, $($field:ident),+) => {
        $(
            if $params.$field != $defaults.$field {
                warn!("using non-default {} = {:?}", stringify!($field), $params.$field);
            }
        )+
    };
}

impl ParametersFile {
    /// Read a parameters file. A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "could not find parameters file at {}, falling back to defaults",
                path.display()
            );
            return Ok(ParametersFile::default());
        }
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        Self::from_toml(&s).with_context(|| path.display().to_string())
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    fn warn_overrides(&self) {
        let defaults = ParametersFile::default();
        warn_non_default!(
            self,
            defaults,
            aligner,
            counter,
            lenient_tool_selection,
            aligner_extra_args,
            counter_extra_args,
            qc_extra_args,
            strand_specificity,
            run_qc,
            threads,
            app_folder,
            reference_folder,
            scratch_folder,
            max_partition_attempts,
            tools
        );
    }

    /// Validate the parameters and resolve tool names into the closed enumerations.
    pub fn resolve(&self) -> Result<PipelineConfig, ConfigurationError> {
        self.warn_overrides();

        let lenient = self.lenient_tool_selection;
        let aligner = resolve_choice::<AlignerKind>("aligner", &self.aligner, lenient)?;
        let counter = resolve_choice::<CounterKind>("counter", &self.counter, lenient)?;
        let strand_specificity = self
            .strand_specificity
            .trim()
            .parse::<StrandSpecificity>()
            .map_err(|_| {
                ConfigurationError::new(
                    "strand_specificity",
                    format!(
                        "{:?} is not one of NONE, FIRST_READ_TRANSCRIPTION_STRAND, \
                         SECOND_READ_TRANSCRIPTION_STRAND",
                        self.strand_specificity
                    ),
                )
            })?;

        if self.annotation_file.trim().is_empty() {
            return Err(ConfigurationError::new(
                "annotation_file",
                "an annotation file name is required",
            ));
        }
        if self.threads == 0 {
            return Err(ConfigurationError::new("threads", "must be at least 1"));
        }
        if self.max_partition_attempts == 0 {
            return Err(ConfigurationError::new(
                "max_partition_attempts",
                "must be at least 1",
            ));
        }

        Ok(PipelineConfig {
            aligner,
            counter,
            aligner_extra_args: self.aligner_extra_args.clone(),
            counter_extra_args: self.counter_extra_args.clone(),
            qc_extra_args: self.qc_extra_args.clone(),
            strand_specificity,
            annotation_file: self.annotation_file.trim().to_string(),
            run_qc: self.run_qc,
            threads: self.threads,
            reference_folder: self.reference_folder.clone(),
            scratch_folder: self.scratch_folder.clone(),
            max_partition_attempts: self.max_partition_attempts,
            tools: ToolPaths::new(&self.app_folder, &self.tools),
        })
    }
}

/// Command prefix used to launch each external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub star: String,
    pub hisat2: String,
    pub feature_counts: String,
    pub htseq_count: String,
    pub picard: String,
}

impl ToolPaths {
    /// Default install locations below `app_folder`, replaced by any override.
    pub fn new(app_folder: &Path, overrides: &ToolOverrides) -> Self {
        let app = app_folder.display();
        let pick = |o: &Option<String>, default: String| o.clone().unwrap_or(default);
        ToolPaths {
            star: pick(&overrides.star, format!("{app}/STAR/STAR")),
            hisat2: pick(&overrides.hisat2, format!("{app}/hisat/hisat2")),
            feature_counts: pick(
                &overrides.feature_counts,
                format!("{app}/subread/featureCounts"),
            ),
            htseq_count: pick(&overrides.htseq_count, "htseq-count".to_string()),
            picard: pick(
                &overrides.picard,
                format!("java8 -jar {app}/picard-tools/picard.jar"),
            ),
        }
    }
}

/// The immutable configuration passed explicitly to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub aligner: AlignerKind,
    pub counter: CounterKind,
    pub aligner_extra_args: String,
    pub counter_extra_args: String,
    pub qc_extra_args: String,
    pub strand_specificity: StrandSpecificity,
    pub annotation_file: String,
    pub run_qc: bool,
    pub threads: usize,
    pub reference_folder: PathBuf,
    pub scratch_folder: PathBuf,
    pub max_partition_attempts: usize,
    pub tools: ToolPaths,
}

impl PipelineConfig {
    pub fn star_index(&self) -> PathBuf {
        self.reference_folder.join("star_index")
    }

    /// Index basename passed to `hisat2 -x`.
    pub fn hisat_index(&self) -> PathBuf {
        self.reference_folder.join("hisat_index").join("hisat2.index")
    }

    pub fn annotation_path(&self) -> PathBuf {
        self.reference_folder
            .join("genome_ref")
            .join(&self.annotation_file)
    }

    pub fn ref_flat_path(&self) -> PathBuf {
        self.reference_folder.join("genome_ref").join("refFlat.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_need_annotation() {
        let err = ParametersFile::default().resolve().unwrap_err();
        assert_eq!(err.field, "annotation_file");
    }

    #[test]
    fn test_parse_and_resolve() -> Result<()> {
        let params = ParametersFile::from_toml(
            r#"
            aligner = "hisat2"
            counter = "htseq"
            annotation_file = "genes.gtf"
            strand_specificity = "FIRST_READ_TRANSCRIPTION_STRAND"
            run_qc = true
            threads = 8
            reference_folder = "/data/ref"

            [tools]
            htseq_count = "/opt/htseq/bin/htseq-count"
            "#,
        )?;
        let config = params.resolve()?;
        assert_eq!(config.aligner, AlignerKind::Hisat2);
        assert_eq!(config.counter, CounterKind::HtSeq);
        assert_eq!(
            config.strand_specificity,
            StrandSpecificity::FirstReadTranscriptionStrand
        );
        assert!(config.run_qc);
        assert_eq!(config.threads, 8);
        assert_eq!(
            config.annotation_path(),
            PathBuf::from("/data/ref/genome_ref/genes.gtf")
        );
        assert_eq!(
            config.hisat_index(),
            PathBuf::from("/data/ref/hisat_index/hisat2.index")
        );
        assert_eq!(config.tools.htseq_count, "/opt/htseq/bin/htseq-count");
        assert_eq!(config.tools.star, "/mnt/app/STAR/STAR");
        assert_eq!(
            config.tools.picard,
            "java8 -jar /mnt/app/picard-tools/picard.jar"
        );
        Ok(())
    }

    #[test]
    fn test_unknown_tool_is_configuration_error() {
        let params = ParametersFile {
            counter: "StringTie".to_string(),
            annotation_file: "genes.gtf".to_string(),
            ..ParametersFile::default()
        };
        assert_eq!(params.resolve().unwrap_err().field, "counter");

        let lenient = ParametersFile {
            lenient_tool_selection: true,
            ..params
        };
        assert_eq!(lenient.resolve().unwrap().counter, CounterKind::FeatureCounts);
    }

    #[test]
    fn test_invalid_values() {
        let base = ParametersFile {
            annotation_file: "genes.gtf".to_string(),
            ..ParametersFile::default()
        };
        let bad_strand = ParametersFile {
            strand_specificity: "REVERSE".to_string(),
            ..base.clone()
        };
        assert_eq!(bad_strand.resolve().unwrap_err().field, "strand_specificity");
        let no_threads = ParametersFile {
            threads: 0,
            ..base.clone()
        };
        assert_eq!(no_threads.resolve().unwrap_err().field, "threads");
        let no_attempts = ParametersFile {
            max_partition_attempts: 0,
            ..base
        };
        assert_eq!(
            no_attempts.resolve().unwrap_err().field,
            "max_partition_attempts"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ParametersFile::from_toml("aligner_threads = 3").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let params = ParametersFile::load(&dir.path().join("parameters.toml"))?;
        assert_eq!(params, ParametersFile::default());
        Ok(())
    }
}
