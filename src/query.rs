//! Prefix descent and ranked extraction, shared by both tree variants.
//!
//! Extraction is best-first: a max-heap holds frontier nodes keyed by
//! `(weight desc, label asc)`. A node's weight is at least the weight of every
//! leaf beneath it and its label is a prefix of (so sorts no later than) every
//! key beneath it, so leaves leave the heap in exactly the final result order
//! and the walk stops once `limit` leaves have been produced.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::node::{branch, precedes, Node};

/// One autocomplete result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion<'a, T, V> {
    pub key: &'a [T],
    pub value: &'a V,
    pub weight: f64,
}

/// Finds the highest node whose subtree holds exactly the keys starting with
/// `prefix`.
///
/// A step may consume several units when labels are compressed, and a prefix
/// ending part way through a label still matches that node.
pub(crate) fn descend<'a, T: Eq, V>(root: &'a Node<T, V>, prefix: &[T]) -> Option<&'a Node<T, V>> {
    let mut node = root;
    loop {
        let label = node.label();
        if prefix.len() <= label.len() {
            return label.starts_with(prefix).then_some(node);
        }
        if !prefix.starts_with(label) {
            return None;
        }
        let depth = label.len();
        let idx = branch(node.children(), depth, &prefix[depth])?;
        node = &node.children()[idx];
    }
}

/// Finds the leaf holding exactly `key`.
pub(crate) fn find_leaf<'a, T: Eq, V>(root: &'a Node<T, V>, key: &[T]) -> Option<&'a Node<T, V>> {
    let mut node = root;
    loop {
        match node {
            Node::Leaf { label, .. } => return (label.as_slice() == key).then_some(node),
            Node::Internal { label, children, .. } => {
                if !key.starts_with(label) {
                    return None;
                }
                let depth = label.len();
                let idx = match key.get(depth) {
                    Some(unit) => branch(children, depth, unit)?,
                    None => children
                        .iter()
                        .position(|c| c.is_leaf() && c.label() == key)?,
                };
                node = &children[idx];
            }
        }
    }
}

struct Frontier<'a, T, V>(&'a Node<T, V>);

impl<T: Ord, V> Ord for Frontier<'_, T, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest element; the node that precedes wins.
        precedes(other.0, self.0)
    }
}

impl<T: Ord, V> PartialOrd for Frontier<'_, T, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord, V> PartialEq for Frontier<'_, T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord, V> Eq for Frontier<'_, T, V> {}

/// Up to `limit` leaves under `root` whose key starts with `prefix`, heaviest
/// first, equal weights in ascending key order. `None` or `Some(0)` returns
/// every match.
pub(crate) fn autocomplete<'a, T: Ord, V>(
    root: Option<&'a Node<T, V>>,
    prefix: &[T],
    limit: Option<usize>,
) -> Vec<Suggestion<'a, T, V>> {
    let Some(start) = root.and_then(|r| descend(r, prefix)) else {
        return Vec::new();
    };
    let limit = match limit {
        None | Some(0) => usize::MAX,
        Some(n) => n,
    };

    let mut out = Vec::new();
    let mut heap = BinaryHeap::new();
    heap.push(Frontier(start));
    while let Some(Frontier(node)) = heap.pop() {
        match node {
            Node::Leaf {
                label,
                weight,
                value,
            } => {
                out.push(Suggestion {
                    key: label,
                    value,
                    weight: *weight,
                });
                if out.len() >= limit {
                    break;
                }
            }
            Node::Internal { children, .. } => heap.extend(children.iter().map(Frontier)),
        }
    }
    out
}

/// Depth-first iterator over the leaves of a tree, in sibling order.
pub struct Iter<'a, T, V> {
    stack: Vec<&'a Node<T, V>>,
}

impl<'a, T, V> Iter<'a, T, V> {
    pub(crate) fn new(root: Option<&'a Node<T, V>>) -> Self {
        Self {
            stack: root.into_iter().collect(),
        }
    }
}

impl<'a, T, V> Iterator for Iter<'a, T, V> {
    type Item = Suggestion<'a, T, V>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf {
                    label,
                    weight,
                    value,
                } => {
                    return Some(Suggestion {
                        key: label,
                        value,
                        weight: *weight,
                    })
                }
                Node::Internal { children, .. } => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}
