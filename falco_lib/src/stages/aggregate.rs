//! Stage AGGREGATE: reduce every partition's records into one count matrix.
//!
//! The reduction runs in three phases:
//! 1. sum values per (sample, key), since one sample may span partitions;
//! 2. regroup the per-sample totals by key;
//! 3. lay the groups out as matrix rows.
//!
//! Phases 1 and 2 are rayon fold/reduce operations over associative and
//! commutative merges, so the order in which the thread pool combines partial
//! results does not affect the outcome. Phase 1 sums with checked arithmetic
//! and fails on `i64` overflow.

use crate::matrix::{CountMatrix, Reports};
use crate::stages::align_and_count::PartitionOutput;
use falco_types::{MetricKey, SampleId};
use metric::{ConcatVec, CountMetric, CountOverflow, JsonReporter, Metric, TxHashMap};
use rayon::prelude::*;

/// Phase 1 result.
pub type SampleTotals = TxHashMap<(SampleId, MetricKey), CountMetric>;

/// Phase 2 result.
pub type CellsByKey = TxHashMap<MetricKey, ConcatVec<(SampleId, i64)>>;

fn merged<M: Metric>(mut a: M, b: M) -> M {
    a.merge(b);
    a
}

fn merge_totals(mut a: SampleTotals, b: SampleTotals) -> Result<SampleTotals, CountOverflow> {
    for (cell, count) in b {
        a.entry(cell).or_default().checked_merge(count)?;
    }
    Ok(a)
}

pub fn combine_by_sample(outputs: &[PartitionOutput]) -> Result<SampleTotals, CountOverflow> {
    outputs
        .par_iter()
        .flat_map_iter(|output| output.records.iter())
        .try_fold(SampleTotals::default, |mut totals, record| -> Result<_, CountOverflow> {
            totals
                .entry((record.sample.clone(), record.key.clone()))
                .or_default()
                .checked_increment_by(record.value)?;
            Ok(totals)
        })
        .try_reduce(SampleTotals::default, merge_totals)
}

pub fn rekey_by_key(totals: SampleTotals) -> CellsByKey {
    totals
        .into_par_iter()
        .fold(CellsByKey::default, |mut cells, ((sample, key), count)| {
            cells.entry(key).or_default().0.push((sample, count.count()));
            cells
        })
        .reduce(CellsByKey::default, merged)
}

pub fn assemble(cells: CellsByKey) -> CountMatrix {
    cells
        .into_iter()
        .flat_map(|(key, cells)| {
            cells
                .into_inner()
                .into_iter()
                .map(move |(sample, value)| (key.clone(), sample, value))
        })
        .collect()
}

/// Run all three phases.
pub fn aggregate(outputs: &[PartitionOutput]) -> Result<CountMatrix, CountOverflow> {
    Ok(assemble(rekey_by_key(combine_by_sample(outputs)?)))
}

/// Job-level counts written next to the reports.
pub fn run_summary(outputs: &[PartitionOutput], reports: &Reports) -> JsonReporter {
    let samples = outputs
        .iter()
        .map(|o| &o.sample)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let mut summary = JsonReporter::default();
    summary.insert("partitions", outputs.len());
    summary.insert("samples", samples);
    summary.insert("expression_rows", reports.expression.len());
    summary.insert("qc_rows", reports.qc.len());
    summary.insert(
        "skipped_split_lines",
        outputs.iter().map(|o| o.skipped_lines).sum::<usize>(),
    );
    summary
}
