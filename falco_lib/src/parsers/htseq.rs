//! htseq-count table, printed on stdout.

use super::parse_count;
use falco_types::{CounterKind, MetricKey, MetricRecord, ParseError, SampleId};

const TOOL: &str = "HTSeq";

/// Special counters are listed after the genes with a `__` prefix.
const SPECIAL_PREFIX: &str = "__";

/// Parse `<key>\t<count>` lines. `__`-prefixed keys become
/// `QC_HTSeq_<key>` records, all other keys are genes.
pub fn parse_htseq(sample: &SampleId, stdout: &str) -> Result<Vec<MetricRecord>, ParseError> {
    let label = CounterKind::HtSeq.metric_label();
    let mut records = Vec::new();
    for (index, line) in stdout.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, count) = match tokens.as_slice() {
            [] => continue,
            [name, count] => (*name, *count),
            _ => {
                return Err(ParseError::MalformedLine {
                    tool: TOOL,
                    line_number: index + 1,
                    line: line.to_string(),
                    reason: "expected exactly a key and a count",
                })
            }
        };
        let key = if name.starts_with(SPECIAL_PREFIX) {
            MetricKey::qc(label, name.trim_matches('_'))
        } else {
            MetricKey::gene(name)
        };
        let value = parse_count(TOOL, key.as_str(), count)?;
        records.push(MetricRecord::new(sample.clone(), key, value));
    }
    Ok(records)
}
