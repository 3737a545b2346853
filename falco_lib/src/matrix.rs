//! The sparse key-by-sample count matrix and its CSV reports.

use anyhow::{Context, Result};
use falco_types::{MetricKey, SampleId};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EXPRESSION_FILE: &str = "samples_expression.csv";
pub const QC_REPORT_FILE: &str = "samples_qc_report.csv";

/// Rows keyed by gene id or QC metric, each holding one cell per sample that
/// reported the key. A missing cell means the tool did not report the key for
/// that sample; it is never filled with zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMatrix {
    rows: BTreeMap<MetricKey, BTreeMap<SampleId, i64>>,
}

impl CountMatrix {
    /// Set the cell at (`key`, `sample`), replacing any earlier value. Cells
    /// are summed across partitions before the matrix is assembled.
    pub fn insert(&mut self, key: MetricKey, sample: SampleId, value: i64) {
        self.rows.entry(key).or_default().insert(sample, value);
    }

    pub fn get(&self, key: &MetricKey, sample: &SampleId) -> Option<i64> {
        self.rows.get(key)?.get(sample).copied()
    }

    pub fn row(&self, key: &MetricKey) -> Option<&BTreeMap<SampleId, i64>> {
        self.rows.get(key)
    }

    /// Rows in ascending key order.
    pub fn rows(&self) -> impl Iterator<Item = (&MetricKey, &BTreeMap<SampleId, i64>)> {
        self.rows.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MetricKey> {
        self.rows.keys()
    }

    /// Every sample with at least one cell, ascending.
    pub fn samples(&self) -> Vec<&SampleId> {
        self.rows.values().flat_map(BTreeMap::keys).unique().sorted().collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Separate gene rows from `QC_` rows.
    pub fn split_reports(self) -> Reports {
        let (qc, expression): (BTreeMap<_, _>, BTreeMap<_, _>) =
            self.rows.into_iter().partition(|(key, _)| key.is_qc());
        Reports {
            expression: CountMatrix { rows: expression },
            qc: CountMatrix { rows: qc },
        }
    }

    /// Write the matrix as CSV: a header of an empty corner label and the
    /// sample ids, then one row per key. Missing cells are empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let samples = self.samples();
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(std::iter::once("").chain(samples.iter().map(|s| s.as_str())))?;
        for (key, cells) in &self.rows {
            let values = samples
                .iter()
                .map(|s| cells.get(*s).map_or_else(String::new, i64::to_string));
            csv.write_record(std::iter::once(key.to_string()).chain(values))?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn to_csv_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).with_context(|| path.display().to_string())?;
        self.write_csv(std::io::BufWriter::new(file))
            .with_context(|| path.display().to_string())
    }
}

impl FromIterator<(MetricKey, SampleId, i64)> for CountMatrix {
    fn from_iter<T: IntoIterator<Item = (MetricKey, SampleId, i64)>>(iter: T) -> Self {
        let mut matrix = CountMatrix::default();
        for (key, sample, value) in iter {
            matrix.insert(key, sample, value);
        }
        matrix
    }
}

/// The two views of a [`CountMatrix`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reports {
    pub expression: CountMatrix,
    pub qc: CountMatrix,
}

impl Reports {
    /// Write both views into `out_dir`, returning the expression matrix and QC
    /// report paths.
    pub fn write(&self, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let expression = out_dir.join(EXPRESSION_FILE);
        let qc = out_dir.join(QC_REPORT_FILE);
        self.expression.to_csv_file(&expression)?;
        self.qc.to_csv_file(&qc)?;
        Ok((expression, qc))
    }
}
