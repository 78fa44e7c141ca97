//! The recursive tree node shared by both tree variants.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::INLINE_LABEL_UNITS;

/// Label storage: short labels live inline in the node.
pub type Label<T> = SmallVec<[T; INLINE_LABEL_UNITS]>;

/// A node of a weighted prefix tree.
///
/// Leaves carry a full key, its payload and the accumulated weight of every
/// insert of that key. Internal nodes carry the partial key shared by the
/// subtree and the sum of their children's weights. Children are kept sorted
/// by descending weight, ties broken by ascending label.
#[derive(Clone, Debug)]
pub enum Node<T, V> {
    Leaf {
        label: Label<T>,
        weight: f64,
        value: V,
    },
    Internal {
        label: Label<T>,
        weight: f64,
        children: Vec<Node<T, V>>,
    },
}

impl<T, V> Node<T, V> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Units from the tree root to this node. For a leaf this is the full key.
    #[inline]
    pub fn label(&self) -> &[T] {
        match self {
            Node::Leaf { label, .. } | Node::Internal { label, .. } => label,
        }
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    /// Children in descending weight order. Empty for leaves.
    #[inline]
    pub fn children(&self) -> &[Node<T, V>] {
        match self {
            Node::Leaf { .. } => &[],
            Node::Internal { children, .. } => children,
        }
    }

    /// The payload of a leaf.
    #[inline]
    pub fn value(&self) -> Option<&V> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Internal { .. } => None,
        }
    }

    pub(crate) fn leaf(key: &[T], weight: f64, value: V) -> Self
    where
        T: Clone,
    {
        Node::Leaf {
            label: Label::from(key),
            weight,
            value,
        }
    }

    /// Internal node over `children`, which are sorted here.
    pub(crate) fn internal(label: &[T], mut children: Vec<Node<T, V>>) -> Self
    where
        T: Ord + Clone,
    {
        children.sort_by(precedes);
        let weight = children.iter().map(Node::weight).sum();
        Node::Internal {
            label: Label::from(label),
            weight,
            children,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node<T, V>>> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { children, .. } => Some(children),
        }
    }

    pub(crate) fn into_value(self) -> Option<V> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Internal { .. } => None,
        }
    }

    /// Adds `delta` to a leaf's weight. Internal weights are derived, see
    /// [`refresh_weight`].
    pub(crate) fn add_leaf_weight(&mut self, delta: f64) {
        if let Node::Leaf { weight, .. } = self {
            *weight += delta;
        }
    }

    /// Replaces an internal node that has exactly one child by that child.
    pub(crate) fn collapse_single_child(&mut self) -> bool {
        let only = match self {
            Node::Internal { children, .. } if children.len() == 1 => children.pop(),
            _ => None,
        };
        match only {
            Some(child) => {
                *self = child;
                true
            }
            None => false,
        }
    }

    /// Moves the node out, leaving an empty internal placeholder behind.
    pub(crate) fn take(&mut self) -> Self {
        std::mem::replace(
            self,
            Node::Internal {
                label: Label::new(),
                weight: 0.0,
                children: Vec::new(),
            },
        )
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf { .. } => count += 1,
                Node::Internal { children, .. } => stack.extend(children),
            }
        }
        count
    }
}

/// Sibling order: heavier first, then ascending label.
#[inline]
pub(crate) fn precedes<T: Ord, V>(a: &Node<T, V>, b: &Node<T, V>) -> Ordering {
    b.weight()
        .total_cmp(&a.weight())
        .then_with(|| a.label().cmp(b.label()))
}

/// Index of the child that branches on `unit` right after a parent label of
/// length `depth`.
///
/// A leaf whose label equals the parent label has no unit at `depth` and is
/// never returned here; see [`terminal_leaf`].
#[inline]
pub(crate) fn branch<T: Eq, V>(children: &[Node<T, V>], depth: usize, unit: &T) -> Option<usize> {
    children
        .iter()
        .position(|c| c.label().get(depth) == Some(unit))
}

/// Index of the leaf child whose key is exactly `key`.
#[inline]
pub(crate) fn terminal_leaf<T: Eq, V>(children: &[Node<T, V>], key: &[T]) -> Option<usize> {
    children
        .iter()
        .position(|c| c.is_leaf() && c.label() == key)
}

/// Moves `children[idx]` to its sorted position after its weight changed.
pub(crate) fn reposition<T: Ord, V>(children: &mut [Node<T, V>], mut idx: usize) {
    while idx > 0 && precedes(&children[idx], &children[idx - 1]) == Ordering::Less {
        children.swap(idx, idx - 1);
        idx -= 1;
    }
    while idx + 1 < children.len() && precedes(&children[idx + 1], &children[idx]) == Ordering::Less
    {
        children.swap(idx, idx + 1);
        idx += 1;
    }
}

/// Recomputes an internal node's weight as the in-order sum of its children.
#[inline]
pub(crate) fn refresh_weight<T, V>(node: &mut Node<T, V>) {
    if let Node::Internal {
        weight, children, ..
    } = node
    {
        *weight = children.iter().map(Node::weight).sum();
    }
}

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub(crate) fn common_prefix_len<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Renders the subtree one node per line, indented by depth.
impl<T: fmt::Display, V> fmt::Display for Node<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            write!(f, "{:indent$}", "", indent = depth * 2)?;
            for unit in node.label() {
                write!(f, "{unit}")?;
            }
            match node {
                Node::Leaf { weight, .. } => writeln!(f, " ({weight}) *")?,
                Node::Internal {
                    weight, children, ..
                } => {
                    writeln!(f, " ({weight})")?;
                    stack.extend(children.iter().rev().map(|c| (c, depth + 1)));
                }
            }
        }
        Ok(())
    }
}
