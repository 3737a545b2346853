//! Metric records: the uniform output of every tool parser.

use crate::sample::SampleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys carrying this prefix are QC metrics; all other keys are gene ids.
pub const QC_PREFIX: &str = "QC_";

/// Row key of the count matrix: a gene identifier or a `QC_<tool>_<metric>` name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(String);

impl MetricKey {
    /// A gene key, kept exactly as the counter reported it.
    pub fn gene(id: impl Into<String>) -> Self {
        MetricKey(id.into())
    }

    /// A QC key `QC_<tool>_<name>` with spaces in `name` replaced by underscores.
    pub fn qc(tool: &str, name: &str) -> Self {
        MetricKey(format!("{QC_PREFIX}{tool}_{}", name.replace(' ', "_")))
    }

    pub fn is_qc(&self) -> bool {
        self.0.starts_with(QC_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (sample, key, value) observation emitted by a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricRecord {
    pub sample: SampleId,
    pub key: MetricKey,
    pub value: i64,
}

impl MetricRecord {
    pub fn new(sample: SampleId, key: MetricKey, value: i64) -> Self {
        MetricRecord { sample, key, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qc_key() {
        let key = MetricKey::qc("STAR", "Number of input reads");
        assert_eq!(key.as_str(), "QC_STAR_Number_of_input_reads");
        assert!(key.is_qc());
    }

    #[test]
    fn test_gene_key() {
        let key = MetricKey::gene("ENSG0001");
        assert!(!key.is_qc());
        assert_eq!(key.to_string(), "ENSG0001");
    }
}
