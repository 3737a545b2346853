//! HISAT2 alignment summary, printed on stderr.

use super::parse_count;
use falco_types::{AlignerKind, MetricKey, MetricRecord, ParseError, SampleId};
use lazy_static::lazy_static;
use regex::Regex;

const TOOL: &str = "HISAT2";

lazy_static! {
    static ref PERCENT_ONLY: Regex = Regex::new(r"^[0-9.]+%").unwrap();
    static ref COUNT_LINE: Regex =
        Regex::new(r"^([0-9]+)[ \t]?(\([0-9.]+%\))?[ \t]?(.*)$").unwrap();
}

/// Parse `<count> [(<pct>%)] <label>` lines into `QC_HISAT_<label>` records.
///
/// Percentage-only lines such as the overall alignment rate are ignored, as
/// are lines that do not start with a count. A line HISAT2 uses to report an
/// error is a [`ParseError::ToolReportedError`].
pub fn parse_hisat_stderr(sample: &SampleId, stderr: &str) -> Result<Vec<MetricRecord>, ParseError> {
    let label = AlignerKind::Hisat2.metric_label();
    let mut records = Vec::new();
    for line in stderr.lines().map(str::trim) {
        if line.contains("(ERR)") || line.starts_with("Error") {
            return Err(ParseError::ToolReportedError {
                tool: TOOL,
                line: line.to_string(),
            });
        }
        if PERCENT_ONLY.is_match(line) {
            continue;
        }
        let Some(caps) = COUNT_LINE.captures(line) else {
            continue;
        };
        let name = caps[3].trim().trim_end_matches(':').trim_end();
        if name.is_empty() {
            continue;
        }
        let key = MetricKey::qc(label, name);
        let value = parse_count(TOOL, key.as_str(), &caps[1])?;
        records.push(MetricRecord::new(sample.clone(), key, value));
    }
    Ok(records)
}
