//! Node tree, query expressions, and scoped editing sessions for PAM stack files
//!
//! A stack file is parsed into a [`Tree`]: one top-level node per line
//! (comments, `@include` directives, and numbered entries), with the fields
//! of an entry stored as labelled children. Nodes are addressed with
//! [`NodePath`]s and selected with [`Query`] expressions. All reads and
//! writes go through a [`Session`], which holds the file lock, records an
//! [`Edit`] per mutation, and commits atomically.

pub mod diff;
pub mod edit;
pub mod editor;
pub mod error;
pub mod grammar;
pub mod node;
pub mod path;
pub mod query;
pub mod session;

pub use diff::{LineChange, TreeDiff};
pub use edit::{Edit, EditKind};
pub use editor::TreeEditor;
pub use error::{Error, Result};
pub use grammar::Grammar;
pub use node::{Node, Tree};
pub use path::{NodePath, Segment, Slot};
pub use query::{Axis, CompareOp, Expr, NameTest, Operand, Position, Predicate, Query, Step};
pub use session::{CommitOutcome, Session};

/// Label of comment nodes
pub const COMMENT_LABEL: &str = "#comment";
/// Label of `@include` directive nodes
pub const INCLUDE_LABEL: &str = "include";
