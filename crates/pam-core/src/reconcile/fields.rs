//! Mutable entry fields
//!
//! Each field the reconciler diffs is a row in [`FIELDS`]: how to read it
//! from a node, what the declaration wants, and how to write it back.

use std::fmt;

use pam_tree::grammar::fields;
use pam_tree::{NodePath, Query, Step, TreeEditor};

use crate::entry::DeclaredEntry;
use crate::Result;

/// A field value, read or declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    /// Order-significant
    List(Vec<String>),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(Some(text)) => f.write_str(text),
            Self::Text(None) => f.write_str("(unset)"),
            Self::List(items) if items.is_empty() => f.write_str("(none)"),
            Self::List(items) => write!(f, "{}", items.join(" ")),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// One diffable field
pub struct Field {
    pub name: &'static str,
    /// Whether the field is diffed for this entry at all
    pub applies: fn(&DeclaredEntry) -> bool,
    pub read: fn(&dyn TreeEditor, &NodePath) -> Result<FieldValue>,
    pub declared: fn(&DeclaredEntry) -> FieldValue,
    pub write: fn(&mut dyn TreeEditor, &NodePath, &DeclaredEntry) -> Result<()>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

/// Fields diffed on an existing entry, in write order
pub static FIELDS: [Field; 3] = [
    Field {
        name: fields::CONTROL,
        // A differing control is a different entry when it is part of the identity
        applies: |entry| !entry.control_is_param,
        read: |editor, node| Ok(FieldValue::Text(editor.get(&node.child(fields::CONTROL))?)),
        declared: |entry| FieldValue::Text(Some(entry.control.clone())),
        write: |editor, node, entry| {
            Ok(editor.set(&node.child(fields::CONTROL), &entry.control)?)
        },
    },
    Field {
        name: "arguments",
        applies: |_| true,
        read: |editor, node| Ok(FieldValue::List(read_arguments(editor, node)?)),
        declared: |entry| FieldValue::List(entry.arguments.clone()),
        write: |editor, node, entry| write_arguments(editor, node, &entry.arguments),
    },
    Field {
        name: fields::OPTIONAL,
        applies: |_| true,
        read: |editor, node| Ok(FieldValue::Flag(has_marker(editor, node)?)),
        declared: |entry| FieldValue::Flag(entry.optional),
        write: |editor, node, entry| {
            let marker = node.child(fields::OPTIONAL);
            if entry.optional {
                if !has_marker(&*editor, node)? {
                    editor.clear(&marker)?;
                }
            } else {
                editor.rm(&marker)?;
            }
            Ok(())
        },
    },
];

fn argument_paths(editor: &dyn TreeEditor, node: &NodePath) -> Result<Vec<NodePath>> {
    Ok(editor.matches(&Query::under(node, Step::label(fields::ARGUMENT)))?)
}

/// Arguments of the entry at `node`, in order
pub(crate) fn read_arguments(editor: &dyn TreeEditor, node: &NodePath) -> Result<Vec<String>> {
    argument_paths(editor, node)?
        .iter()
        .map(|path| Ok(editor.get(path)?.unwrap_or_default()))
        .collect()
}

pub(crate) fn has_marker(editor: &dyn TreeEditor, node: &NodePath) -> Result<bool> {
    Ok(!editor
        .matches(&Query::under(node, Step::label(fields::OPTIONAL)))?
        .is_empty())
}

/// Replace the whole argument list, keeping `arguments` in order.
pub(crate) fn write_arguments(
    editor: &mut dyn TreeEditor,
    node: &NodePath,
    arguments: &[String],
) -> Result<()> {
    // Last first, so earlier ranks stay valid
    for path in argument_paths(&*editor, node)?.iter().rev() {
        editor.rm(path)?;
    }
    append_arguments(editor, node, arguments)
}

pub(crate) fn append_arguments(
    editor: &mut dyn TreeEditor,
    node: &NodePath,
    arguments: &[String],
) -> Result<()> {
    for argument in arguments {
        editor.set(&node.append(fields::ARGUMENT), argument)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_display_for_reports() {
        assert_eq!(FieldValue::Text(Some("required".into())).to_string(), "required");
        assert_eq!(FieldValue::Text(None).to_string(), "(unset)");
        assert_eq!(
            FieldValue::List(vec!["retry=3".into(), "type=".into()]).to_string(),
            "retry=3 type="
        );
        assert_eq!(FieldValue::List(Vec::new()).to_string(), "(none)");
        assert_eq!(FieldValue::Flag(true).to_string(), "true");
    }

    #[test]
    fn test_control_is_skipped_when_part_of_identity() {
        let entry = crate::DeclaredEntry::new(crate::Phase::Auth, "required", "pam_env.so")
            .with_control_is_param(true);
        let applicable: Vec<&str> = FIELDS
            .iter()
            .filter(|field| (field.applies)(&entry))
            .map(|field| field.name)
            .collect();
        assert_eq!(applicable, ["arguments", "optional"]);
    }
}
