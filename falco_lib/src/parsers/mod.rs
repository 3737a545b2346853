//! Grammars for the text each external tool produces.
//!
//! Every parser turns raw tool output into [`MetricRecord`]s for one sample.
//! Lines covered by a documented skip rule are ignored; anything else that
//! does not fit the grammar is a [`ParseError`].

use falco_types::ParseError;

pub mod feature_counts;
pub mod hisat;
pub mod htseq;
pub mod picard;
pub mod star;

pub use feature_counts::{parse_feature_counts, parse_feature_counts_summary};
pub use hisat::parse_hisat_stderr;
pub use htseq::parse_htseq;
pub use picard::parse_picard_metrics;
pub use star::parse_star_log;

/// Parse a count reported by `tool` for `key`. Counts are non-negative.
pub(crate) fn parse_count(tool: &'static str, key: &str, raw: &str) -> Result<i64, ParseError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(ParseError::InvalidValue {
            tool,
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
