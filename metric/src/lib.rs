#![deny(
    missing_docs,
    missing_copy_implementations,
    non_upper_case_globals,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_extern_crates,
    unused_import_braces
)]

//!
//! Mergeable metrics for combining per-partition results into job totals.
//!
//! A [`Metric`] is any value with an associative and commutative `merge`, so
//! partial results can be combined in whatever order a thread pool delivers
//! them and still give the same answer.
//!
//! * [`CountMetric`] sums integer counts.
//! * A `HashMap` of metrics merges value-wise per key.
//! * [`ConcatVec`] merges by list concatenation.
//! * [`JsonReporter`] is a flat key/value summary written as JSON.
//!

use ahash::AHasher;
use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fs::File;
use std::hash::{BuildHasher, Hash};
use std::io::{BufWriter, Write};
use std::path::Path;

pub mod collections;
pub mod count_metric;
pub use crate::collections::ConcatVec;
pub use crate::count_metric::{CountMetric, CountOverflow};

/// A fixed-seed hasher, so hash-keyed iteration and hashes are reproducible
/// between runs.
#[derive(Clone, Copy, Default)]
pub struct TxHasher;

impl TxHasher {
    fn random_state() -> ahash::RandomState {
        ahash::RandomState::with_seeds(0, 0, 0, 0)
    }

    /// Hash a single value.
    pub fn hash(x: impl Hash) -> u64 {
        Self::random_state().hash_one(x)
    }
}

impl BuildHasher for TxHasher {
    type Hasher = AHasher;

    fn build_hasher(&self) -> AHasher {
        Self::random_state().build_hasher()
    }
}

/// A `HashMap` keyed with [`TxHasher`].
pub type TxHashMap<K, V> = HashMap<K, V, TxHasher>;

/// A value that can absorb another value of the same type.
///
/// `merge` must be associative and commutative.
pub trait Metric: Serialize + for<'de> Deserialize<'de> {
    /// Fold `other` into `self`.
    fn merge(&mut self, other: Self);

    /// Merge every chunk into a default value.
    ///
    /// ```rust
    /// use metric::{CountMetric, Metric};
    /// let total = CountMetric::from_chunks((1..=4).map(CountMetric::from));
    /// assert_eq!(total, CountMetric::from(10));
    /// ```
    fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        Self: Default,
    {
        let mut total = Self::default();
        for chunk in chunks {
            total.merge(chunk);
        }
        total
    }

    /// Write the metric as pretty-printed JSON.
    fn to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| path.display().to_string())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| path.display().to_string())?;
        writer.flush()?;
        Ok(())
    }
}

/// A flat JSON summary. Keys are written in sorted order.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct JsonReporter {
    entries: TxHashMap<String, Value>,
}

impl Serialize for JsonReporter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_unstable_by_key(|&(key, _)| key);
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (key, value) in sorted {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Something that can be summarized as a [`JsonReporter`].
pub trait JsonReport {
    /// Build the summary.
    fn to_json_reporter(&self) -> JsonReporter;

    /// Build the summary and write it to `path`.
    fn report(&self, path: &Path) -> Result<()> {
        self.to_json_reporter().to_file(path)
    }
}

impl JsonReport for JsonReporter {
    fn to_json_reporter(&self) -> JsonReporter {
        self.clone()
    }
}

impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for JsonReporter {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> JsonReporter {
        let mut reporter = JsonReporter::default();
        for (key, value) in iter {
            reporter.insert(key, value);
        }
        reporter
    }
}

impl JsonReporter {
    /// Add an entry.
    ///
    /// # Panics
    /// If `key` is already present.
    pub fn insert(&mut self, key: impl ToString, value: impl Into<Value>) {
        let key = key.to_string();
        assert!(!self.entries.contains_key(&key), "duplicate summary key {key}");
        self.entries.insert(key, value.into());
    }

    /// Look up an entry.
    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        String: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Metric for JsonReporter {
    /// # Panics
    /// If the two reporters share a key.
    fn merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}
