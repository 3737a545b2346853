//! Sample identity derived from partition names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended to a sample name when one sample is split into several
/// partitions, followed by the partition index.
const PARTITION_SUFFIX: &str = "_part";

/// Strip any leading path and every extension from a partition name.
///
/// `s3://bucket/runs/S1_part0.txt.gz` becomes `S1_part0`. The result names the
/// partition's scratch directory and prefixes its read files.
pub fn partition_prefix(name: &str) -> &str {
    let file_name = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
    file_name.split('.').next().unwrap_or(file_name)
}

/// The logical biological sample a partition belongs to.
///
/// Every partition of one sample maps to the same `SampleId`, so that records
/// they report for the same key are summed downstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(name: impl Into<String>) -> Self {
        SampleId(name.into())
    }

    /// Derive the sample from a partition name: strip the path, the
    /// extension, and a trailing `_partN` suffix.
    pub fn from_partition_name(name: &str) -> Self {
        let prefix = partition_prefix(name);
        let sample = match prefix.rsplit_once(PARTITION_SUFFIX) {
            Some((head, index))
                if !head.is_empty()
                    && !index.is_empty()
                    && index.bytes().all(|b| b.is_ascii_digit()) =>
            {
                head
            }
            _ => prefix,
        };
        SampleId(sample.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SampleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_prefix() {
        assert_eq!(partition_prefix("S1_part0.txt"), "S1_part0");
        assert_eq!(partition_prefix("hdfs:///data/in/S1_part0.txt/"), "S1_part0");
        assert_eq!(partition_prefix("s3://bucket/a/b/S2.fq.txt"), "S2");
        assert_eq!(partition_prefix("S3"), "S3");
    }

    #[test]
    fn test_partitions_share_sample() {
        let s0 = SampleId::from_partition_name("S1_part0.txt");
        let s1 = SampleId::from_partition_name("S1_part1.txt");
        assert_eq!(s0, s1);
        assert_eq!(s0.as_str(), "S1");
        assert_eq!(
            SampleId::from_partition_name("/input/S1_part12.txt").as_str(),
            "S1"
        );
    }

    #[test]
    fn test_sample_without_partition_suffix() {
        assert_eq!(SampleId::from_partition_name("liver.txt").as_str(), "liver");
        // Only a numeric partition index is stripped.
        assert_eq!(
            SampleId::from_partition_name("S1_partial.txt").as_str(),
            "S1_partial"
        );
        assert_eq!(SampleId::from_partition_name("_part3.txt").as_str(), "_part3");
    }

    #[test]
    fn test_sample_is_deterministic() {
        let name = "gs://runs/batch_7/Tumor_A_part3.txt";
        assert_eq!(
            SampleId::from_partition_name(name),
            SampleId::from_partition_name(name)
        );
        assert_eq!(SampleId::from_partition_name(name).to_string(), "Tumor_A");
    }
}
