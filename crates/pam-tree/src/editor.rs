//! The tree editor contract consumed by the reconciler

use crate::error::Result;
use crate::path::NodePath;
use crate::query::Query;

/// Read/write access to one stack file's node tree.
///
/// Implementations are scoped to a single file for the duration of one
/// transaction; callers hold [`NodePath`]s only, never node values.
pub trait TreeEditor {
    /// Paths of every node `query` selects, in document order. Selecting
    /// nothing is not an error.
    fn matches(&self, query: &Query) -> Result<Vec<NodePath>>;

    /// Value at `path`; `None` when the node is missing or valueless.
    fn get(&self, path: &NodePath) -> Result<Option<String>>;

    /// Set the value at `path`, creating missing nodes along the way.
    fn set(&mut self, path: &NodePath, value: &str) -> Result<()>;

    /// Create an empty node labelled `label` next to `anchor` and return
    /// its path.
    fn insert(&mut self, anchor: &NodePath, label: &str, before: bool) -> Result<NodePath>;

    /// Remove the node at `path` with its subtree. Returns how many nodes
    /// were removed (0 or 1).
    fn rm(&mut self, path: &NodePath) -> Result<usize>;

    /// Make the node at `path` exist without a value.
    fn clear(&mut self, path: &NodePath) -> Result<()>;

    /// Create the node at `path` if it is missing.
    fn touch(&mut self, path: &NodePath) -> Result<()>;
}
