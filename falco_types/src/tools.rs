//! Closed enumerations of the external tools each stage can run.

use crate::errors::ConfigurationError;
use log::warn;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Aligners supported by the alignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AlignerKind {
    #[default]
    #[strum(to_string = "STAR")]
    Star,
    #[strum(to_string = "HISAT2", serialize = "hisat")]
    Hisat2,
}

impl AlignerKind {
    /// Tool label embedded in this aligner's QC keys.
    pub fn metric_label(self) -> &'static str {
        match self {
            AlignerKind::Star => "STAR",
            AlignerKind::Hisat2 => "HISAT",
        }
    }
}

/// Quantification tools supported by the counting step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CounterKind {
    #[default]
    #[strum(to_string = "featureCounts", serialize = "featureCount")]
    FeatureCounts,
    #[strum(to_string = "HTSeq", serialize = "htseq-count")]
    HtSeq,
}

impl CounterKind {
    /// Tool label embedded in this counter's QC keys.
    pub fn metric_label(self) -> &'static str {
        match self {
            CounterKind::FeatureCounts => "featureCount",
            CounterKind::HtSeq => "HTSeq",
        }
    }
}

/// The optional alignment QC tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum QcToolKind {
    #[default]
    #[strum(to_string = "Picard tools")]
    Picard,
}

impl QcToolKind {
    pub fn metric_label(self) -> &'static str {
        match self {
            QcToolKind::Picard => "picard",
        }
    }
}

/// Strand specificity of the library, passed through to the QC tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum StrandSpecificity {
    #[default]
    None,
    FirstReadTranscriptionStrand,
    SecondReadTranscriptionStrand,
}

/// Parse a tool choice. An unrecognized name is a configuration error unless
/// `lenient` is set, in which case the default tool is substituted and the
/// substitution is logged.
pub fn resolve_choice<T>(field: &'static str, name: &str, lenient: bool) -> Result<T, ConfigurationError>
where
    T: FromStr + Default + fmt::Display,
{
    match name.trim().parse::<T>() {
        Ok(choice) => Ok(choice),
        Err(_) if lenient => {
            let fallback = T::default();
            warn!("{field} {name:?} is not yet supported. Defaulting to {fallback}");
            Ok(fallback)
        }
        Err(_) => Err(ConfigurationError::new(
            field,
            format!("unsupported tool {name:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_aligner_aliases() {
        for name in ["STAR", "star", "Star"] {
            assert_eq!(name.parse::<AlignerKind>().unwrap(), AlignerKind::Star);
        }
        for name in ["hisat", "HISAT2", "hisat2"] {
            assert_eq!(name.parse::<AlignerKind>().unwrap(), AlignerKind::Hisat2);
        }
        assert!("bwa".parse::<AlignerKind>().is_err());
    }

    #[test]
    fn test_counter_aliases() {
        for name in ["featureCount", "featurecounts", "FEATURECOUNTS"] {
            assert_eq!(name.parse::<CounterKind>().unwrap(), CounterKind::FeatureCounts);
        }
        for name in ["htseq", "HTSeq", "htseq-count"] {
            assert_eq!(name.parse::<CounterKind>().unwrap(), CounterKind::HtSeq);
        }
    }

    #[test]
    fn test_strand_round_trip_names() {
        let names: Vec<String> = StrandSpecificity::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "NONE",
                "FIRST_READ_TRANSCRIPTION_STRAND",
                "SECOND_READ_TRANSCRIPTION_STRAND"
            ]
        );
        assert_eq!(
            "second_read_transcription_strand"
                .parse::<StrandSpecificity>()
                .unwrap(),
            StrandSpecificity::SecondReadTranscriptionStrand
        );
    }

    #[test]
    fn test_resolve_choice() {
        assert_eq!(
            resolve_choice::<CounterKind>("counter", "htseq", false).unwrap(),
            CounterKind::HtSeq
        );
        let err = resolve_choice::<CounterKind>("counter", "StringTie", false).unwrap_err();
        assert_eq!(err.field, "counter");
        assert_eq!(
            resolve_choice::<CounterKind>("counter", "StringTie", true).unwrap(),
            CounterKind::FeatureCounts
        );
        assert_eq!(
            resolve_choice::<AlignerKind>("aligner", "bowtie", true).unwrap(),
            AlignerKind::Star
        );
    }
}
