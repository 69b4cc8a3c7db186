//! Reconciliation of declared entries against a stack file
//!
//! - **locator**: the step selecting an entry's node(s)
//! - **fields**: the mutable fields and how to read, compare, and write them
//! - **reconciler**: create / update / remove / reposition
//! - **enumerator**: every entry of a file as an [`Instance`]

mod enumerator;
mod fields;
mod locator;
mod reconciler;

pub use enumerator::{Instance, Instances, enumerate};
pub use fields::{FIELDS, Field, FieldValue};
pub use locator::locate;
pub use reconciler::{Change, Outcome, Reconciled, Reconciler};
