//! # prefix-rank
//!
//! Weighted prefix trees for ranked autocomplete.
//!
//! Two variants share one node type and one query engine:
//!
//! - [`SimplePrefixTree`]: one key unit per level.
//! - [`CompressedPrefixTree`]: internal nodes with a single child are merged
//!   into that child, so depth follows branching rather than key length.
//!
//! Every insert carries a weight. A leaf accumulates the weights of all inserts
//! of its key; an internal node's weight is the sum of its children's. Children
//! are kept sorted by descending weight so the heaviest completions of a prefix
//! are found without visiting the whole subtree.
//!
//! ## Example
//!
//! ```rust
//! use prefix_rank::{PrefixIndex, SimplePrefixTree};
//!
//! let mut tree: SimplePrefixTree<char, &str> = SimplePrefixTree::new();
//! tree.insert(&['c', 'a', 't'], 5.0, "cat").unwrap();
//! tree.insert(&['c', 'a', 'r'], 3.0, "car").unwrap();
//! tree.insert(&['d', 'o', 'g'], 2.0, "dog").unwrap();
//!
//! let found: Vec<&str> = tree
//!     .autocomplete(&['c', 'a'], Some(2))
//!     .iter()
//!     .map(|s| *s.value)
//!     .collect();
//! assert_eq!(found, vec!["cat", "car"]);
//! ```

pub mod compressed;
pub mod error;
pub mod node;
pub mod query;
pub mod simple;
pub mod verify;

pub use compressed::CompressedPrefixTree;
pub use error::{Error, InvariantViolation, Result};
pub use node::{Label, Node};
pub use query::{Iter, Suggestion};
pub use simple::SimplePrefixTree;

use tracing::debug;

// =============================================================================
// Configuration
// =============================================================================

/// Label units stored inline in a node before spilling to the heap.
pub(crate) const INLINE_LABEL_UNITS: usize = 8;

/// Rejects weights that would break the non-negative accumulation rule.
#[inline]
pub(crate) fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

/// Rejects a weight that would make `total` infinite. Every leaf and internal
/// weight is bounded by the total, so none of them can overflow either.
#[inline]
pub(crate) fn check_total(total: f64, weight: f64) -> Result<()> {
    if (total + weight).is_finite() {
        Ok(())
    } else {
        Err(Error::WeightOverflow { weight, total })
    }
}

/// Operations shared by both tree variants.
///
/// Implementors provide the mutations and access to the root; ranked queries,
/// lookups and bulk operations are derived from the common [`Node`] contract.
pub trait PrefixIndex<T: Ord + Clone, V> {
    /// The root node, or `None` for the empty tree.
    fn root(&self) -> Option<&Node<T, V>>;

    /// Number of distinct keys.
    fn len(&self) -> usize;

    /// Adds `weight` to `key`, creating its leaf with `value` if needed.
    ///
    /// When the key already exists its stored value is kept and `value` is
    /// dropped.
    fn insert(&mut self, key: &[T], weight: f64, value: V) -> Result<()>;

    /// Removes `key` and returns its value, or `None` if it was not present.
    fn remove(&mut self, key: &[T]) -> Option<V>;

    /// Runs every structural and weight check for this variant.
    fn check_invariants(&self) -> std::result::Result<(), InvariantViolation<T>>;

    fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    /// Total weight of every key in the tree.
    fn weight(&self) -> f64 {
        self.root().map_or(0.0, Node::weight)
    }

    /// Up to `limit` keys starting with `prefix`, heaviest first. Equal weights
    /// come back in ascending key order. `None` or `Some(0)` returns every
    /// match.
    fn autocomplete(&self, prefix: &[T], limit: Option<usize>) -> Vec<Suggestion<'_, T, V>> {
        query::autocomplete(self.root(), prefix, limit)
    }

    /// The value and accumulated weight stored for exactly `key`.
    fn get<'a>(&'a self, key: &[T]) -> Option<(&'a V, f64)>
    where
        T: 'a,
    {
        let leaf = query::find_leaf(self.root()?, key)?;
        leaf.value().map(|value| (value, leaf.weight()))
    }

    fn contains_key(&self, key: &[T]) -> bool {
        self.get(key).is_some()
    }

    /// Every key in depth-first sibling order.
    fn iter(&self) -> Iter<'_, T, V> {
        Iter::new(self.root())
    }

    /// Inserts every `(key, weight, value)` record, stopping at the first
    /// invalid weight. Records before the failing one stay inserted.
    fn insert_all<I, K>(&mut self, records: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, f64, V)>,
        K: AsRef<[T]>,
    {
        for (key, weight, value) in records {
            self.insert(key.as_ref(), weight, value)?;
        }
        Ok(())
    }

    /// Removes every key starting with `prefix`, returning how many were
    /// removed.
    fn remove_prefix(&mut self, prefix: &[T]) -> usize {
        let keys: Vec<Vec<T>> = self
            .autocomplete(prefix, None)
            .iter()
            .map(|s| s.key.to_vec())
            .collect();
        let mut removed = 0;
        for key in &keys {
            if self.remove(key).is_some() {
                removed += 1;
            }
        }
        debug!(removed, prefix_len = prefix.len(), "removed keys by prefix");
        removed
    }
}


#[cfg(test)]
mod proptests;
