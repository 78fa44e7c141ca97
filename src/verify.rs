//! Independent checks of tree shape and weights.
//!
//! These walk a tree through the public [`Node`] accessors only and recompute
//! everything the mutation paths maintain incrementally. Each check stops at
//! the first violation it finds.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::InvariantViolation;
use crate::node::{common_prefix_len, precedes, Node};

type Checked<T> = Result<(), InvariantViolation<T>>;

/// Checks the invariants shared by both variants: no childless internal node,
/// internal weight equal to the in-order sum of the children, siblings sorted
/// and on distinct branches, every label extending its parent's.
pub fn check_weights<T: Ord + Clone, V>(root: &Node<T, V>) -> Checked<T> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let Node::Internal {
            label,
            weight,
            children,
        } = node
        else {
            continue;
        };

        if children.is_empty() {
            return Err(InvariantViolation::Childless {
                label: label.to_vec(),
            });
        }

        let expected: f64 = children.iter().map(Node::weight).sum();
        if expected != *weight {
            return Err(InvariantViolation::WeightMismatch {
                label: label.to_vec(),
                expected,
                actual: *weight,
            });
        }

        for (i, pair) in children.windows(2).enumerate() {
            if precedes(&pair[0], &pair[1]) != Ordering::Less {
                return Err(InvariantViolation::Unsorted {
                    label: label.to_vec(),
                    position: i + 1,
                });
            }
        }

        let depth = label.len();
        let mut branches = BTreeSet::new();
        for (i, child) in children.iter().enumerate() {
            if !child.label().starts_with(label) {
                return Err(InvariantViolation::NotExtending {
                    parent: label.to_vec(),
                    child: child.label().to_vec(),
                });
            }
            if !branches.insert(child.label().get(depth)) {
                return Err(InvariantViolation::DuplicateBranch {
                    label: label.to_vec(),
                    position: i,
                });
            }
        }

        stack.extend(children);
    }
    Ok(())
}

/// Checks the one-unit-per-level shape: the root has the empty label, each
/// internal child adds exactly one unit, each leaf repeats its parent's label.
pub fn check_simple_shape<T: Ord + Clone, V>(root: &Node<T, V>) -> Checked<T> {
    if !root.label().is_empty() || root.is_leaf() {
        return Err(InvariantViolation::RootLabel {
            label: root.label().to_vec(),
        });
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let parent = node.label();
        for child in node.children() {
            let label = child.label();
            if child.is_leaf() {
                if label != parent {
                    return Err(InvariantViolation::MisplacedLeaf {
                        parent: parent.to_vec(),
                        child: label.to_vec(),
                    });
                }
            } else if label.len() != parent.len() + 1 || !label.starts_with(parent) {
                return Err(InvariantViolation::BadStep {
                    parent: parent.to_vec(),
                    child: label.to_vec(),
                });
            }
        }
        stack.extend(node.children());
    }
    Ok(())
}

/// Checks the compressed shape: every internal node has at least two
/// children, is deeper than its parent and is labelled with exactly the
/// longest common prefix of the keys beneath it.
pub fn check_compressed_shape<T: Ord + Clone, V>(root: &Node<T, V>) -> Checked<T> {
    subtree_prefix(root).map(|_| ())
}

/// Longest common prefix of the keys under `node`, validating on the way.
fn subtree_prefix<T: Ord + Clone, V>(node: &Node<T, V>) -> Result<&[T], InvariantViolation<T>> {
    let Node::Internal {
        label, children, ..
    } = node
    else {
        return Ok(node.label());
    };

    match children.len() {
        0 => {
            return Err(InvariantViolation::Childless {
                label: label.to_vec(),
            })
        }
        1 => {
            return Err(InvariantViolation::SingleChild {
                label: label.to_vec(),
            })
        }
        _ => {}
    }

    let mut prefix: Option<&[T]> = None;
    for child in children {
        if !child.is_leaf() && child.label().len() <= label.len() {
            return Err(InvariantViolation::NotDeeper {
                parent: label.to_vec(),
                child: child.label().to_vec(),
            });
        }
        let sub = subtree_prefix(child)?;
        prefix = Some(match prefix {
            None => sub,
            Some(prev) => &prev[..common_prefix_len(prev, sub)],
        });
    }

    let prefix = prefix.unwrap_or_default();
    if prefix != label.as_slice() {
        return Err(InvariantViolation::NotLongestPrefix {
            label: label.to_vec(),
            expected: prefix.to_vec(),
        });
    }
    Ok(label.as_slice())
}

/// Checks that `expected` matches the number of leaves under `root`.
pub fn check_len<T, V>(root: &Node<T, V>, expected: usize) -> Checked<T> {
    let actual = root.leaf_count();
    if actual != expected {
        return Err(InvariantViolation::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// Checks leaves against the records that built the tree: each leaf's weight
/// is the sum of the weights recorded for its key, in record order, and every
/// recorded key has a leaf.
pub fn check_leaf_weights<T, V, I, K>(root: Option<&Node<T, V>>, records: I) -> Checked<T>
where
    T: Ord + Clone,
    I: IntoIterator<Item = (K, f64)>,
    K: AsRef<[T]>,
{
    let mut expected: BTreeMap<Vec<T>, f64> = BTreeMap::new();
    for (key, weight) in records {
        *expected.entry(key.as_ref().to_vec()).or_insert(0.0) += weight;
    }

    let mut seen = 0usize;
    let mut stack: Vec<&Node<T, V>> = root.into_iter().collect();
    while let Some(node) = stack.pop() {
        if !node.is_leaf() {
            stack.extend(node.children());
            continue;
        }
        let Some(&want) = expected.get(node.label()) else {
            return Err(InvariantViolation::UnexpectedKey {
                key: node.label().to_vec(),
            });
        };
        if want != node.weight() {
            return Err(InvariantViolation::WeightMismatch {
                label: node.label().to_vec(),
                expected: want,
                actual: node.weight(),
            });
        }
        seen += 1;
    }

    if seen != expected.len() {
        let missing = expected
            .keys()
            .find(|k| root.and_then(|r| crate::query::find_leaf(r, k)).is_none());
        if let Some(key) = missing {
            return Err(InvariantViolation::MissingKey { key: key.clone() });
        }
    }
    Ok(())
}
