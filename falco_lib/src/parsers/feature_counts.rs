//! featureCounts gene table and its `.summary` companion.

use super::parse_count;
use falco_types::{CounterKind, MetricKey, MetricRecord, ParseError, SampleId};

const TOOL: &str = "featureCounts";

/// Lines before the gene rows: the command echo and the column header.
const HEADER_LINES: usize = 2;

/// Parse the gene table. Each row contributes (first token, last token) as
/// (gene id, count); blank rows are ignored.
pub fn parse_feature_counts(sample: &SampleId, table: &str) -> Result<Vec<MetricRecord>, ParseError> {
    let mut records = Vec::new();
    for (index, line) in table.lines().enumerate().skip(HEADER_LINES) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            [_] => {
                return Err(ParseError::MalformedLine {
                    tool: TOOL,
                    line_number: index + 1,
                    line: line.to_string(),
                    reason: "expected a gene id and a count",
                })
            }
            [gene, .., count] => {
                let value = parse_count(TOOL, gene, count)?;
                records.push(MetricRecord::new(sample.clone(), MetricKey::gene(*gene), value));
            }
        }
    }
    Ok(records)
}

/// Parse `<status>\t<count>` lines of the summary into
/// `QC_featureCount_<status>` records, status lower-cased.
pub fn parse_feature_counts_summary(
    sample: &SampleId,
    summary: &str,
) -> Result<Vec<MetricRecord>, ParseError> {
    let label = CounterKind::FeatureCounts.metric_label();
    let mut records = Vec::new();
    for line in summary.lines() {
        let fields: Vec<&str> = line.trim().split('\t').collect();
        match fields.as_slice() {
            [status, count] if *status != "Status" => {
                let key = MetricKey::qc(label, &status.to_lowercase());
                let value = parse_count(TOOL, key.as_str(), count)?;
                records.push(MetricRecord::new(sample.clone(), key, value));
            }
            _ => continue,
        }
    }
    Ok(records)
}
