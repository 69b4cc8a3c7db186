//! Stacked-rule file grammars
//!
//! Per-service files under `/etc/pam.d` and the combined `/etc/pam.conf`
//! share one line syntax; the combined file adds a leading service column.
//!
//! ```text
//! #%PAM-1.0
//! auth        required      pam_env.so
//! -session    optional      pam_systemd.so
//! account     [default=bad success=ok user_unknown=ignore] pam_sss.so
//! @include common-auth
//! ```

use std::path::Path;

use pam_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{Node, Tree};
use crate::{COMMENT_LABEL, INCLUDE_LABEL};

/// Entry field labels
pub mod fields {
    pub const SERVICE: &str = "service";
    pub const TYPE: &str = "type";
    pub const CONTROL: &str = "control";
    pub const MODULE: &str = "module";
    pub const ARGUMENT: &str = "argument";
    pub const OPTIONAL: &str = "optional";
}

const TYPES: [&str; 4] = ["auth", "account", "password", "session"];

/// Line syntax of a stack file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// One file per service; the service is implied by the file name
    PamD,
    /// The combined multi-service file
    PamConf,
}

impl Grammar {
    /// Select the grammar for `target`: the combined grammar only when the
    /// target *is* the combined file.
    pub fn for_target(target: &NormalizedPath, combined_file: &NormalizedPath) -> Self {
        if target == combined_file {
            Self::PamConf
        } else {
            Self::PamD
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PamD => "pam",
            Self::PamConf => "pamconf",
        }
    }

    /// Whether entries carry a `service` field
    pub fn has_service(&self) -> bool {
        matches!(self, Self::PamConf)
    }

    /// Parse `source`; `path` only labels errors.
    pub fn parse(&self, path: &Path, source: &str) -> Result<Tree> {
        let mut tree = Tree::new();
        let mut trivia = String::new();
        let mut seq = 0usize;

        for (lineno, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                trivia.push_str(line);
                trivia.push('\n');
                continue;
            }

            let mut node = if let Some(text) = trimmed.strip_prefix('#') {
                Node::with_value(COMMENT_LABEL, text.trim())
            } else if let Some(name) = include_target(trimmed) {
                Node::with_value(INCLUDE_LABEL, name)
            } else {
                seq += 1;
                self.parse_entry(seq, trimmed)
                    .map_err(|message| Error::Parse {
                        path: path.to_path_buf(),
                        line: lineno + 1,
                        message,
                    })?
            };

            node.trivia = std::mem::take(&mut trivia);
            node.source = Some(line.to_string());
            tree.push(node);
        }

        tree.trailing = trivia;
        tracing::debug!(
            path = %path.display(),
            grammar = self.name(),
            entries = seq,
            "parsed stack file"
        );
        Ok(tree)
    }

    fn parse_entry(&self, seq: usize, line: &str) -> std::result::Result<Node, String> {
        let mut tokens = tokenize(line)?.into_iter();
        let mut node = Node::new(seq.to_string());

        if self.has_service() {
            let service = tokens.next().ok_or("missing service")?;
            node.push(Node::with_value(fields::SERVICE, service));
        }

        let raw_type = tokens.next().ok_or("missing type")?;
        let (optional, kind) = match raw_type.strip_prefix('-') {
            Some(kind) => (true, kind.to_string()),
            None => (false, raw_type),
        };
        if !TYPES.iter().any(|t| t.eq_ignore_ascii_case(&kind)) {
            return Err(format!("unknown type '{kind}'"));
        }

        if optional {
            node.push(Node::new(fields::OPTIONAL));
        }
        node.push(Node::with_value(fields::TYPE, kind.to_ascii_lowercase()));

        let control = tokens.next().ok_or("missing control")?;
        node.push(Node::with_value(fields::CONTROL, control));

        let module = tokens.next().ok_or("missing module")?;
        node.push(Node::with_value(fields::MODULE, module));

        for argument in tokens {
            node.push(Node::with_value(fields::ARGUMENT, argument));
        }
        Ok(node)
    }

    /// Render `tree` back to text. Unmodified lines keep their original
    /// spacing.
    pub fn render(&self, tree: &Tree) -> Result<String> {
        let mut out = String::new();
        for node in tree.root().children() {
            out.push_str(&node.trivia);
            match &node.source {
                Some(line) => out.push_str(line),
                None => out.push_str(&self.render_node(node)?),
            }
            out.push('\n');
        }
        out.push_str(&tree.trailing);
        Ok(out)
    }

    fn render_node(&self, node: &Node) -> Result<String> {
        match node.label() {
            COMMENT_LABEL => Ok(format!("# {}", node.value().unwrap_or_default())),
            INCLUDE_LABEL => Ok(format!("@include {}", node.value().unwrap_or_default())),
            _ => self.render_entry(node),
        }
    }

    fn render_entry(&self, node: &Node) -> Result<String> {
        let field = |name: &str| {
            node.child_value(name).ok_or_else(|| Error::Render {
                label: node.label().to_string(),
                message: format!("missing {name}"),
            })
        };

        let mut line = String::new();
        if self.has_service() {
            line.push_str(field(fields::SERVICE)?);
            line.push('\t');
        }
        if node.child(fields::OPTIONAL).is_some() {
            line.push('-');
        }
        line.push_str(field(fields::TYPE)?);
        line.push('\t');
        line.push_str(field(fields::CONTROL)?);
        line.push('\t');
        line.push_str(field(fields::MODULE)?);
        for argument in node.child_values(fields::ARGUMENT) {
            line.push(' ');
            line.push_str(argument);
        }
        Ok(line)
    }
}

fn include_target(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("@include")?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Split an entry line on whitespace, keeping `[...]` groups whole.
pub fn tokenize(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '[' {
            let mut depth = 0usize;
            loop {
                match chars.next() {
                    Some('\\') => {
                        token.push('\\');
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    Some('[') => {
                        depth += 1;
                        token.push('[');
                    }
                    Some(']') => {
                        depth -= 1;
                        token.push(']');
                        if depth == 0 {
                            break;
                        }
                    }
                    Some(ch) => token.push(ch),
                    None => return Err("unterminated '['".to_string()),
                }
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}
