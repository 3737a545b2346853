//! Picard metrics files.
//!
//! A metrics file holds one or more sections introduced by a
//! `## METRICS CLASS <class>` marker line, followed by a tab-separated header
//! line and a tab-separated values line.

use super::parse_count;
use falco_types::{MetricKey, MetricRecord, ParseError, QcToolKind, SampleId};

const TOOL: &str = "Picard tools";

const MARKER: &str = "METRICS CLASS";

/// Integer metrics collected from each section.
pub const PICARD_METRICS: [&str; 10] = [
    "pf_bases",
    "pf_aligned_bases",
    "ribosomal_bases",
    "coding_bases",
    "utr_bases",
    "intronic_bases",
    "intergenic_bases",
    "ignored_reads",
    "correct_strand_reads",
    "incorrect_strand_reads",
];

fn marker_class(line: &str) -> Option<&str> {
    line.strip_prefix("##")?.trim_start().strip_prefix(MARKER).map(str::trim)
}

fn section_line<'a>(lines: &[&'a str], index: usize, class: &str, what: &str) -> Result<&'a str, ParseError> {
    lines.get(index).copied().ok_or_else(|| ParseError::MissingSection {
        tool: TOOL,
        what: format!("{what} line of {class}"),
    })
}

/// Parse every metrics section into `QC_picard_<metric>` records. Empty values
/// are skipped; a header without one of [`PICARD_METRICS`] is an error.
pub fn parse_picard_metrics(sample: &SampleId, metrics: &str) -> Result<Vec<MetricRecord>, ParseError> {
    let label = QcToolKind::Picard.metric_label();
    let lines: Vec<&str> = metrics.lines().collect();
    let mut records = Vec::new();

    let mut index = 0;
    while index < lines.len() {
        let Some(class) = marker_class(lines[index].trim()) else {
            index += 1;
            continue;
        };
        let header = section_line(&lines, index + 1, class, "header")?
            .trim()
            .to_lowercase();
        let values: Vec<&str> = section_line(&lines, index + 2, class, "values")?
            .trim_end_matches('\r')
            .split('\t')
            .collect();

        let columns: Vec<&str> = header.split('\t').collect();
        for metric in PICARD_METRICS {
            let column = columns.iter().position(|c| *c == metric).ok_or_else(|| {
                ParseError::MissingKey {
                    tool: TOOL,
                    key: metric.to_string(),
                    section: class.to_string(),
                }
            })?;
            let raw = values.get(column).map_or("", |v| v.trim());
            if raw.is_empty() {
                continue;
            }
            let key = MetricKey::qc(label, metric);
            let value = parse_count(TOOL, key.as_str(), raw)?;
            records.push(MetricRecord::new(sample.clone(), key, value));
        }
        index += 3;
    }
    Ok(records)
}
