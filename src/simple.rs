//! Prefix tree with one key unit per level.
//!
//! The root of a non-empty tree is the internal node with the empty label.
//! Each internal child extends its parent's label by exactly one unit, and a
//! key's leaf hangs under the internal node whose label equals that key:
//!
//! ```text
//! "" (10)
//!   c (8)
//!     ca (8)
//!       cat (5)
//!         cat (5) *
//!       car (3)
//!         car (3) *
//!   d (2)
//!     ...
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::error::{InvariantViolation, Result};
use crate::node::{branch, refresh_weight, reposition, terminal_leaf, Label, Node};
use crate::{check_total, check_weight, verify, PrefixIndex};

/// Weighted prefix tree with one level per key unit.
#[derive(Clone, Debug)]
pub struct SimplePrefixTree<T, V> {
    root: Option<Node<T, V>>,
    count: usize,
}

impl<T: Ord + Clone, V> SimplePrefixTree<T, V> {
    pub fn new() -> Self {
        Self {
            root: None,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<&Node<T, V>> {
        self.root.as_ref()
    }

    /// Adds `weight` to `key`.
    ///
    /// A new key gets a leaf holding `value`, spliced in below the deepest
    /// existing internal node on its path together with any missing one-unit
    /// internal nodes. An existing key keeps its value and only gains weight.
    pub fn insert(&mut self, key: &[T], weight: f64, value: V) -> Result<()> {
        check_weight(weight)?;
        check_total(self.root.as_ref().map_or(0.0, Node::weight), weight)?;
        trace!(key_len = key.len(), weight, "simple insert");

        let added = match self.root.as_mut() {
            Some(root) => insert_at(root, key, weight, value),
            None => {
                self.root = Some(chain(key, 0, weight, value));
                true
            }
        };
        if added {
            self.count += 1;
        }
        Ok(())
    }

    /// Removes `key`, pruning internal nodes left without children.
    pub fn remove(&mut self, key: &[T]) -> Option<V> {
        let root = self.root.as_mut()?;
        let removed = remove_from(root, key)?;
        if root.children().is_empty() {
            debug!("simple tree emptied");
            self.root = None;
        } else {
            refresh_weight(root);
        }
        self.count -= 1;
        trace!(key_len = key.len(), "simple remove");
        Some(removed)
    }

    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation<T>> {
        let Some(root) = self.root.as_ref() else {
            return Ok(());
        };
        verify::check_weights(root)?;
        verify::check_simple_shape(root)?;
        verify::check_len(root, self.count)
    }
}

/// Builds the internal nodes `key[..depth]`, `key[..depth + 1]`, ... `key`,
/// each holding the next, the last one holding the leaf.
fn chain<T: Clone, V>(key: &[T], depth: usize, weight: f64, value: V) -> Node<T, V> {
    let mut node = Node::leaf(key, weight, value);
    for end in (depth..=key.len()).rev() {
        node = Node::Internal {
            label: Label::from(&key[..end]),
            weight,
            children: vec![node],
        };
    }
    node
}

/// Inserts below `node`, whose label is a prefix of `key`. Returns whether a
/// new leaf was created.
fn insert_at<T: Ord + Clone, V>(node: &mut Node<T, V>, key: &[T], weight: f64, value: V) -> bool {
    let depth = node.label().len();
    let Some(children) = node.children_mut() else {
        debug_assert!(node.label() == key);
        node.add_leaf_weight(weight);
        return false;
    };

    let found = match key.get(depth) {
        None => terminal_leaf(children, key),
        Some(unit) => branch(children, depth, unit),
    };
    let added = match found {
        Some(idx) => {
            let added = insert_at(&mut children[idx], key, weight, value);
            reposition(children, idx);
            added
        }
        None => {
            let fresh = if depth == key.len() {
                Node::leaf(key, weight, value)
            } else {
                chain(key, depth + 1, weight, value)
            };
            children.push(fresh);
            let last = children.len() - 1;
            reposition(children, last);
            true
        }
    };
    refresh_weight(node);
    added
}

/// Removes `key` from below the internal `node`. Children left empty are
/// dropped; the caller handles `node` itself.
fn remove_from<T: Ord, V>(node: &mut Node<T, V>, key: &[T]) -> Option<V> {
    let depth = node.label().len();
    let children = node.children_mut()?;

    match key.get(depth) {
        None => {
            let idx = terminal_leaf(children, key)?;
            children.remove(idx).into_value()
        }
        Some(unit) => {
            let idx = branch(children, depth, unit)?;
            let removed = remove_from(&mut children[idx], key)?;
            if children[idx].children().is_empty() {
                children.remove(idx);
                debug!(depth = depth + 1, "pruned childless node");
            } else {
                refresh_weight(&mut children[idx]);
                reposition(children, idx);
            }
            Some(removed)
        }
    }
}

impl<T: Ord + Clone, V> Default for SimplePrefixTree<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, V> PrefixIndex<T, V> for SimplePrefixTree<T, V> {
    fn root(&self) -> Option<&Node<T, V>> {
        self.root.as_ref()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn insert(&mut self, key: &[T], weight: f64, value: V) -> Result<()> {
        SimplePrefixTree::insert(self, key, weight, value)
    }

    fn remove(&mut self, key: &[T]) -> Option<V> {
        SimplePrefixTree::remove(self, key)
    }

    fn check_invariants(&self) -> std::result::Result<(), InvariantViolation<T>> {
        SimplePrefixTree::check_invariants(self)
    }
}

impl<T: fmt::Display, V> fmt::Display for SimplePrefixTree<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => fmt::Display::fmt(root, f),
            None => writeln!(f, "(empty)"),
        }
    }
}
