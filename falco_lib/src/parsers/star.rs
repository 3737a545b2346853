//! STAR `Log.final.out`.

use super::parse_count;
use falco_types::{AlignerKind, MetricKey, MetricRecord, ParseError, SampleId};

const TOOL: &str = "STAR";

/// Metrics collected from the log, matched case-insensitively.
pub const STAR_METRICS: [&str; 10] = [
    "number of input reads",
    "uniquely mapped reads number",
    "number of splices: total",
    "number of splices: annotated (sjdb)",
    "number of splices: gt/ag",
    "number of splices: gc/ag",
    "number of splices: at/ac",
    "number of splices: non-canonical",
    "number of reads mapped to multiple loci",
    "number of reads mapped to too many loci",
];

/// Parse `<name> |\t<value>` lines. Lines with fewer than two tab-separated
/// fields and metrics outside [`STAR_METRICS`] are ignored.
pub fn parse_star_log(sample: &SampleId, log: &str) -> Result<Vec<MetricRecord>, ParseError> {
    let label = AlignerKind::Star.metric_label();
    let mut records = Vec::new();
    for line in log.lines() {
        let fields: Vec<&str> = line.trim().split('\t').collect();
        if fields.len() < 2 {
            continue;
        }
        let name = fields[0].trim_matches(|c| c == '|' || c == ' ');
        if !STAR_METRICS.contains(&name.to_lowercase().as_str()) {
            continue;
        }
        let key = MetricKey::qc(label, name);
        let value = parse_count(TOOL, key.as_str(), fields[1])?;
        records.push(MetricRecord::new(sample.clone(), key, value));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOG: &str = "                                 Started job on |\tSep 09 10:12:51
                             Started mapping on |\tSep 09 10:13:28
                                    Finished on |\tSep 09 10:14:04
       Mapping speed, Million of reads per hour |\t100.00

                          Number of input reads |\t1000000
                      Average input read length |\t202
                                    UNIQUE READS:
                   Uniquely mapped reads number |\t912345
                        Uniquely mapped reads % |\t91.23%
                       Number of splices: Total |\t301234
            Number of splices: Annotated (sjdb) |\t299876
                       Number of splices: GT/AG |\t297000
                       Number of splices: GC/AG |\t2500
                       Number of splices: AT/AC |\t300
               Number of splices: Non-canonical |\t1434
                               MULTI-MAPPING READS:
        Number of reads mapped to multiple loci |\t45678
             % of reads mapped to multiple loci |\t4.57%
        Number of reads mapped to too many loci |\t321
";

    #[test]
    fn test_spec_example_line() {
        let sample = SampleId::new("S1");
        let records = parse_star_log(&sample, "| Number of input reads |\t1000000\n").unwrap();
        assert_eq!(
            records,
            vec![MetricRecord::new(
                sample,
                MetricKey::qc("STAR", "Number of input reads"),
                1000000
            )]
        );
        assert_eq!(records[0].key.as_str(), "QC_STAR_Number_of_input_reads");
    }

    #[test]
    fn test_full_log() {
        let sample = SampleId::new("S1");
        let records = parse_star_log(&sample, LOG).unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "QC_STAR_Number_of_input_reads",
                "QC_STAR_Uniquely_mapped_reads_number",
                "QC_STAR_Number_of_splices:_Total",
                "QC_STAR_Number_of_splices:_Annotated_(sjdb)",
                "QC_STAR_Number_of_splices:_GT/AG",
                "QC_STAR_Number_of_splices:_GC/AG",
                "QC_STAR_Number_of_splices:_AT/AC",
                "QC_STAR_Number_of_splices:_Non-canonical",
                "QC_STAR_Number_of_reads_mapped_to_multiple_loci",
                "QC_STAR_Number_of_reads_mapped_to_too_many_loci",
            ]
        );
        assert_eq!(records[1].value, 912345);
        assert_eq!(records[9].value, 321);
    }

    #[test]
    fn test_bad_value_is_parse_error() {
        let err = parse_star_log(&SampleId::new("S1"), "Number of input reads |\tmany\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { tool: "STAR", .. }));
    }
}
