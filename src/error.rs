//! Error types for tree mutations and invariant checks.

use thiserror::Error;

/// Result type alias for fallible tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by mutating operations.
///
/// Lookups and removals never fail: a missing key or an empty tree simply
/// yields nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Weight was negative, NaN or infinite.
    #[error("invalid weight {0}: weights must be finite and non-negative")]
    InvalidWeight(f64),

    /// Adding the weight would push the tree total past `f64::MAX`.
    #[error("weight {weight} overflows the tree total {total}")]
    WeightOverflow { weight: f64, total: f64 },
}

/// A structural or weight invariant that does not hold.
///
/// These are logic errors inside the tree, never expected at runtime. They are
/// produced by the `check_*` functions in [`crate::verify`] and carry the label
/// of the offending node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation<T> {
    /// An internal node without children.
    #[error("internal node {label:?} has no children")]
    Childless { label: Vec<T> },

    /// A compressed-tree internal node with exactly one child.
    #[error("internal node {label:?} has a single child")]
    SingleChild { label: Vec<T> },

    /// A child label that does not extend its parent's label.
    #[error("node {child:?} does not extend parent label {parent:?}")]
    NotExtending { parent: Vec<T>, child: Vec<T> },

    /// A simple-tree internal child whose label is not parent label plus one unit.
    #[error("internal node {child:?} is not one unit longer than parent {parent:?}")]
    BadStep { parent: Vec<T>, child: Vec<T> },

    /// A simple-tree leaf whose label differs from its parent's label.
    #[error("leaf {child:?} is not labelled like its parent {parent:?}")]
    MisplacedLeaf { parent: Vec<T>, child: Vec<T> },

    /// A compressed-tree internal label that is not the longest common prefix
    /// of the keys beneath it.
    #[error("internal node {label:?} is not the longest common prefix {expected:?}")]
    NotLongestPrefix { label: Vec<T>, expected: Vec<T> },

    /// Internal weight differs from the sum of its children.
    #[error("node {label:?} has weight {actual}, expected {expected}")]
    WeightMismatch {
        label: Vec<T>,
        expected: f64,
        actual: f64,
    },

    /// Siblings out of (weight desc, label asc) order.
    #[error("children of {label:?} are not sorted at position {position}")]
    Unsorted { label: Vec<T>, position: usize },

    /// Two siblings claim the same branch.
    #[error("children of {label:?} collide at position {position}")]
    DuplicateBranch { label: Vec<T>, position: usize },

    /// A compressed-tree internal child that is not deeper than its parent.
    #[error("internal node {child:?} is not deeper than parent {parent:?}")]
    NotDeeper { parent: Vec<T>, child: Vec<T> },

    /// A simple tree whose root is not the empty label.
    #[error("root is labelled {label:?}, expected the empty label")]
    RootLabel { label: Vec<T> },

    /// The tree's key count disagrees with its leaves.
    #[error("tree reports {expected} keys but holds {actual} leaves")]
    LengthMismatch { expected: usize, actual: usize },

    /// A recorded key has no leaf.
    #[error("key {key:?} is missing from the tree")]
    MissingKey { key: Vec<T> },

    /// A leaf exists for a key that was never recorded.
    #[error("leaf {key:?} was never inserted")]
    UnexpectedKey { key: Vec<T> },
}
