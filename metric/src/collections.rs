//! Collections of metrics: a `HashMap` merges value-wise per key, and
//! `ConcatVec` is a list whose merge is concatenation.

use crate::Metric;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Per-key merge: shared keys merge their values, keys only in `other` are
/// moved over.
impl<K, V, S> Metric for HashMap<K, V, S>
where
    K: Eq + Hash + Serialize + for<'de> Deserialize<'de>,
    V: Metric,
    S: BuildHasher + Default,
{
    fn merge(&mut self, other: Self) {
        use std::collections::hash_map::Entry;
        for (key, value) in other {
            match self.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().merge(value),
                Entry::Vacant(e) => {
                    e.insert(value);
                }
            }
        }
    }
}

/// A list of items merged by concatenation.
///
/// Concatenation is associative but not commutative; callers that need an
/// order-independent result must key the items so that their final
/// placement does not depend on list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcatVec<T>(pub Vec<T>);

impl<T> Default for ConcatVec<T> {
    fn default() -> Self {
        ConcatVec(Vec::new())
    }
}

impl<T> From<Vec<T>> for ConcatVec<T> {
    fn from(items: Vec<T>) -> Self {
        ConcatVec(items)
    }
}

impl<T> ConcatVec<T> {
    /// Consume the wrapper and return the items.
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Metric for ConcatVec<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn merge(&mut self, mut other: Self) {
        self.0.append(&mut other.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count_metric::CountMetric;
    use crate::TxHashMap;

    #[test]
    fn check_hashmap_merge() {
        let totals = |pairs: &[(&str, i64)]| -> TxHashMap<String, CountMetric> {
            pairs
                .iter()
                .map(|&(gene, n)| (gene.to_string(), CountMetric::from(n)))
                .collect()
        };
        let mut part0 = totals(&[("ENSG0001", 10), ("ENSG0002", 5)]);
        part0.merge(totals(&[("ENSG0001", 20), ("ENSG0003", 40)]));
        assert_eq!(
            part0,
            totals(&[("ENSG0001", 30), ("ENSG0002", 5), ("ENSG0003", 40)])
        );
    }

    #[test]
    fn check_concat_merge() {
        let mut v1 = ConcatVec::from(vec![("S1".to_string(), 3)]);
        v1.merge(ConcatVec::from(vec![("S2".to_string(), 4)]));
        v1.merge(ConcatVec::default());
        assert_eq!(
            v1.into_inner(),
            vec![("S1".to_string(), 3), ("S2".to_string(), 4)]
        );
    }
}
