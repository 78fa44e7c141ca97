//! Path-compressed prefix tree.
//!
//! No internal node has exactly one child. An internal node is labelled with
//! the longest common prefix of the keys beneath it, so one level may consume
//! many key units. A tree holding a single key is just that key's leaf.
//!
//! Inserting `cat 5`, `car 3`, `dog 2`:
//!
//! ```text
//!  (10)
//!   ca (8)
//!     cat (5) *
//!     car (3) *
//!   dog (2) *
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::error::{InvariantViolation, Result};
use crate::node::{branch, common_prefix_len, refresh_weight, reposition, terminal_leaf, Node};
use crate::{check_total, check_weight, verify, PrefixIndex};

/// Weighted prefix tree without single-child internal nodes.
#[derive(Clone, Debug)]
pub struct CompressedPrefixTree<T, V> {
    root: Option<Node<T, V>>,
    count: usize,
}

impl<T: Ord + Clone, V> CompressedPrefixTree<T, V> {
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
    /// Where the key leaves the existing paths, the node it diverges from is
    /// re-rooted under a new internal node labelled with their full shared
    /// prefix, next to a new leaf for the key.
    pub fn insert(&mut self, key: &[T], weight: f64, value: V) -> Result<()> {
        check_weight(weight)?;
        check_total(self.root.as_ref().map_or(0.0, Node::weight), weight)?;
        trace!(key_len = key.len(), weight, "compressed insert");

        let added = match self.root.as_mut() {
            Some(root) => insert_at(root, key, weight, value),
            None => {
                self.root = Some(Node::leaf(key, weight, value));
                true
            }
        };
        if added {
            self.count += 1;
        }
        Ok(())
    }

    /// Removes `key`. An internal node left with one child is replaced by
    /// that child.
    pub fn remove(&mut self, key: &[T]) -> Option<V> {
        let root = self.root.as_mut()?;
        let removed = if root.is_leaf() {
            if root.label() != key {
                return None;
            }
            debug!("compressed tree emptied");
            self.root.take().and_then(Node::into_value)?
        } else {
            let removed = remove_from(root, key)?;
            match root.children().len() {
                0 => self.root = None,
                1 => {
                    root.collapse_single_child();
                    debug!("collapsed root");
                }
                _ => {}
            }
            removed
        };
        self.count -= 1;
        trace!(key_len = key.len(), "compressed remove");
        Some(removed)
    }

    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation<T>> {
        let Some(root) = self.root.as_ref() else {
            return Ok(());
        };
        verify::check_weights(root)?;
        verify::check_compressed_shape(root)?;
        verify::check_len(root, self.count)
    }
}

/// Inserts into the subtree at `node`. Returns whether a new leaf was created.
fn insert_at<T: Ord + Clone, V>(node: &mut Node<T, V>, key: &[T], weight: f64, value: V) -> bool {
    let depth = node.label().len();
    let shared = common_prefix_len(node.label(), key);

    if node.is_leaf() && shared == depth && depth == key.len() {
        node.add_leaf_weight(weight);
        return false;
    }
    if node.is_leaf() || shared < depth {
        split(node, shared, key, weight, value);
        return true;
    }

    debug_assert!(key.starts_with(node.label()));
    let Some(children) = node.children_mut() else {
        return false;
    };
    let found = match key.get(depth) {
        None => terminal_leaf(children, key),
        Some(unit) => branch(children, depth, unit),
    };
    match found {
        Some(idx) => {
            let added = insert_at(&mut children[idx], key, weight, value);
            reposition(children, idx);
            refresh_weight(node);
            added
        }
        None => {
            children.push(Node::leaf(key, weight, value));
            let last = children.len() - 1;
            reposition(children, last);
            refresh_weight(node);
            true
        }
    }
}

/// Re-roots `node` under a new internal node labelled `key[..shared]`, next
/// to a new leaf for `key`.
fn split<T: Ord + Clone, V>(node: &mut Node<T, V>, shared: usize, key: &[T], weight: f64, value: V) {
    debug_assert!(shared <= key.len() && shared <= node.label().len());
    debug_assert!(node.is_leaf() || shared < node.label().len());
    let old = node.take();
    debug!(
        shared,
        old_len = old.label().len(),
        key_len = key.len(),
        "split on divergence"
    );
    *node = Node::internal(&key[..shared], vec![old, Node::leaf(key, weight, value)]);
}

/// Removes `key` from below the internal `node`. A child left with one child
/// of its own is collapsed into it; the caller handles `node` itself.
fn remove_from<T: Ord, V>(node: &mut Node<T, V>, key: &[T]) -> Option<V> {
    if !key.starts_with(node.label()) {
        return None;
    }
    let depth = node.label().len();
    let children = node.children_mut()?;
    let idx = match key.get(depth) {
        None => terminal_leaf(children, key)?,
        Some(unit) => branch(children, depth, unit)?,
    };

    let removed = if children[idx].is_leaf() {
        if children[idx].label() != key {
            return None;
        }
        children.remove(idx).into_value()?
    } else {
        let removed = remove_from(&mut children[idx], key)?;
        match children[idx].children().len() {
            0 => {
                children.remove(idx);
            }
            1 => {
                children[idx].collapse_single_child();
                debug!(depth, "collapsed single-child node");
                reposition(children, idx);
            }
            _ => {
                refresh_weight(&mut children[idx]);
                reposition(children, idx);
            }
        }
        removed
    };
    refresh_weight(node);
    Some(removed)
}

impl<T: Ord + Clone, V> Default for CompressedPrefixTree<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, V> PrefixIndex<T, V> for CompressedPrefixTree<T, V> {
    fn root(&self) -> Option<&Node<T, V>> {
        self.root.as_ref()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn insert(&mut self, key: &[T], weight: f64, value: V) -> Result<()> {
        CompressedPrefixTree::insert(self, key, weight, value)
    }

    fn remove(&mut self, key: &[T]) -> Option<V> {
        CompressedPrefixTree::remove(self, key)
    }

    fn check_invariants(&self) -> std::result::Result<(), InvariantViolation<T>> {
        CompressedPrefixTree::check_invariants(self)
    }
}

impl<T: fmt::Display, V> fmt::Display for CompressedPrefixTree<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => fmt::Display::fmt(root, f),
            None => writeln!(f, "(empty)"),
        }
    }
}
