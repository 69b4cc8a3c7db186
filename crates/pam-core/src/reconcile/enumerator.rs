//! Instance enumeration

use pam_tree::grammar::fields;
use pam_tree::{COMMENT_LABEL, Expr, Grammar, INCLUDE_LABEL, NodePath, Query, Step, TreeEditor};
use serde::{Deserialize, Serialize};

use super::fields::{has_marker, read_arguments};
use crate::entry::DeclaredEntry;
use crate::Result;

/// An entry as it exists in a stack file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Only present for the combined file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(rename = "type")]
    pub phase: String,
    pub control: String,
    pub module: String,
    pub arguments: Vec<String>,
    pub optional: bool,
}

impl Instance {
    /// Whether this instance carries exactly the declared fields.
    pub fn matches(&self, entry: &DeclaredEntry) -> bool {
        self.phase.eq_ignore_ascii_case(entry.phase.as_str())
            && self.control == entry.control
            && self.module == entry.module
            && self.arguments == entry.arguments
            && self.optional == entry.optional
            && (self.service.is_none() || self.service == entry.service)
    }
}

/// Lazily materialized entries of one scan
pub struct Instances<'a> {
    editor: &'a dyn TreeEditor,
    combined: bool,
    paths: std::vec::IntoIter<NodePath>,
}

impl Instances<'_> {
    fn read(&self, node: &NodePath) -> Result<Instance> {
        let text = |field: &str| -> Result<String> {
            Ok(self.editor.get(&node.child(field))?.unwrap_or_default())
        };
        Ok(Instance {
            service: if self.combined {
                Some(text(fields::SERVICE)?)
            } else {
                None
            },
            phase: text(fields::TYPE)?,
            control: text(fields::CONTROL)?,
            module: text(fields::MODULE)?,
            arguments: read_arguments(self.editor, node)?,
            optional: has_marker(self.editor, node)?,
        })
    }
}

impl Iterator for Instances<'_> {
    type Item = Result<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.paths.next()?;
        Some(self.read(&node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Scan every entry node of the tree behind `editor`.
///
/// Fields are read as the iterator advances; each call rescans.
pub fn enumerate(editor: &dyn TreeEditor, grammar: Grammar) -> Result<Instances<'_>> {
    let step = Step::any().filter(Expr::label_ne(COMMENT_LABEL).and(Expr::label_ne(INCLUDE_LABEL)));
    let paths = editor.matches(&Query::new(step))?;
    tracing::debug!(entries = paths.len(), "enumerating entries");
    Ok(Instances {
        editor,
        combined: grammar.has_service(),
        paths: paths.into_iter(),
    })
}
