//! Query expressions over a node tree
//!
//! Queries select nodes the way the stacked-rule provider needs to: by the
//! values of an entry's fields, by position among the matches, and by the
//! relation between siblings. The textual form is a small path subset:
//!
//! ```text
//! *[type='auth' and module='pam_deny.so'][1]
//! *[type='password' and control='requisite'][last()]
//! *[label()!='#comment']
//! *[type='auth' and module='pam_unix.so'][following-sibling::*[type='auth' and module='pam_env.so'][1]]
//! ```
//!
//! Field comparisons are existential: an entry matches `argument='nullok'`
//! when any of its `argument` children has that value.

use crate::error::{Error, Result};
use crate::node::{Node, Tree};
use crate::path::NodePath;

/// Which children a step considers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    Label(String),
}

impl NameTest {
    fn accepts(&self, node: &Node) -> bool {
        match self {
            Self::Any => true,
            Self::Label(label) => node.label() == label,
        }
    }
}

/// Positional predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `[n]`, 1-based
    Index(usize),
    /// `[last()]`
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

impl CompareOp {
    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

/// Left-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Values of the children with this label
    Field(String),
    /// `label()` of the node itself
    Label,
}

/// Sibling relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    FollowingSibling,
    /// Reverse axis: position 1 is the nearest preceding sibling
    PrecedingSibling,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Self::FollowingSibling => "following-sibling",
            Self::PrecedingSibling => "preceding-sibling",
        }
    }
}

/// Boolean predicate expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Compare {
        operand: Operand,
        op: CompareOp,
        value: String,
    },
    /// A child with this label exists
    Exists(String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// Some sibling on `axis` is selected by `step`
    Sibling { axis: Axis, step: Box<Step> },
}

impl Expr {
    pub fn eq(field: &str, value: &str) -> Self {
        Self::Compare {
            operand: Operand::Field(field.to_string()),
            op: CompareOp::Eq,
            value: value.to_string(),
        }
    }

    pub fn label_ne(value: &str) -> Self {
        Self::Compare {
            operand: Operand::Label,
            op: CompareOp::Ne,
            value: value.to_string(),
        }
    }

    pub fn exists(field: &str) -> Self {
        Self::Exists(field.to_string())
    }

    pub fn following(step: Step) -> Self {
        Self::Sibling {
            axis: Axis::FollowingSibling,
            step: Box::new(step),
        }
    }

    pub fn preceding(step: Step) -> Self {
        Self::Sibling {
            axis: Axis::PrecedingSibling,
            step: Box::new(step),
        }
    }

    /// Conjoin two expressions, flattening nested conjunctions
    pub fn and(self, other: Expr) -> Self {
        let mut terms = match self {
            Self::And(terms) => terms,
            expr => vec![expr],
        };
        match other {
            Self::And(more) => terms.extend(more),
            expr => terms.push(expr),
        }
        Self::And(terms)
    }

    fn matches(&self, parent: &Node, idx: usize) -> bool {
        let node = &parent.children()[idx];
        match self {
            Self::Compare {
                operand: Operand::Label,
                op,
                value,
            } => op.holds(node.label(), value),
            Self::Compare {
                operand: Operand::Field(field),
                op,
                value,
            } => node.child_values(field).any(|v| op.holds(v, value)),
            Self::Exists(field) => node.child(field).is_some(),
            Self::And(terms) => terms.iter().all(|t| t.matches(parent, idx)),
            Self::Or(terms) => terms.iter().any(|t| t.matches(parent, idx)),
            Self::Sibling { axis, step } => {
                let siblings: Vec<usize> = match axis {
                    Axis::FollowingSibling => (idx + 1..parent.children().len()).collect(),
                    Axis::PrecedingSibling => (0..idx).rev().collect(),
                };
                !step.select(parent, siblings).is_empty()
            }
        }
    }

    fn fmt_nested(&self, f: &mut std::fmt::Formatter<'_>, in_and: bool) -> std::fmt::Result {
        match self {
            Self::Compare { operand, op, value } => {
                match operand {
                    Operand::Field(field) => write!(f, "{field}")?,
                    Operand::Label => write!(f, "label()")?,
                }
                write!(f, "{}{}", op.symbol(), quote(value))
            }
            Self::Exists(field) => write!(f, "{field}"),
            Self::And(terms) => join(f, terms, " and ", true),
            Self::Or(terms) if in_and => {
                write!(f, "(")?;
                join(f, terms, " or ", false)?;
                write!(f, ")")
            }
            Self::Or(terms) => join(f, terms, " or ", false),
            Self::Sibling { axis, step } => write!(f, "{}::{}", axis.name(), step),
        }
    }
}

fn join(
    f: &mut std::fmt::Formatter<'_>,
    terms: &[Expr],
    separator: &str,
    in_and: bool,
) -> std::fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        term.fmt_nested(f, in_and)?;
    }
    Ok(())
}

fn quote(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_nested(f, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Position(Position),
    Expr(Expr),
}

/// A name test followed by predicates, applied in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: NameTest,
    pub predicates: Vec<Predicate>,
}

impl Step {
    /// `*`
    pub fn any() -> Self {
        Self {
            name: NameTest::Any,
            predicates: Vec::new(),
        }
    }

    pub fn label(label: &str) -> Self {
        Self {
            name: NameTest::Label(label.to_string()),
            predicates: Vec::new(),
        }
    }

    /// Append a boolean predicate
    pub fn filter(mut self, expr: Expr) -> Self {
        self.predicates.push(Predicate::Expr(expr));
        self
    }

    /// Append a positional predicate
    pub fn at(mut self, position: Position) -> Self {
        self.predicates.push(Predicate::Position(position));
        self
    }

    /// Parse the textual form of a single step.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text)?;
        let step = parser.step()?;
        parser.finish()?;
        Ok(step)
    }

    /// Indices of the children of `parent`, drawn from `candidates` in the
    /// given order, that this step selects.
    fn select(&self, parent: &Node, candidates: Vec<usize>) -> Vec<usize> {
        let mut selected: Vec<usize> = candidates
            .into_iter()
            .filter(|&i| self.name.accepts(&parent.children()[i]))
            .collect();

        for predicate in &self.predicates {
            selected = match predicate {
                Predicate::Position(Position::Index(n)) => n
                    .checked_sub(1)
                    .and_then(|i| selected.get(i).copied())
                    .into_iter()
                    .collect(),
                Predicate::Position(Position::Last) => selected.last().copied().into_iter().collect(),
                Predicate::Expr(expr) => selected
                    .into_iter()
                    .filter(|&i| expr.matches(parent, i))
                    .collect(),
            };
        }
        selected
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            NameTest::Any => write!(f, "*")?,
            NameTest::Label(label) => write!(f, "{label}")?,
        }
        for predicate in &self.predicates {
            match predicate {
                Predicate::Position(Position::Index(n)) => write!(f, "[{n}]")?,
                Predicate::Position(Position::Last) => write!(f, "[last()]")?,
                Predicate::Expr(expr) => write!(f, "[{expr}]")?,
            }
        }
        Ok(())
    }
}

/// Steps evaluated from a base node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    base: NodePath,
    steps: Vec<Step>,
}

impl Query {
    /// A single step evaluated against the children of the root
    pub fn new(step: Step) -> Self {
        Self {
            base: NodePath::root(),
            steps: vec![step],
        }
    }

    /// A single step evaluated against the children of `base`
    pub fn under(base: &NodePath, step: Step) -> Self {
        Self {
            base: base.clone(),
            steps: vec![step],
        }
    }

    /// Parse `/`-separated steps evaluated from the root.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text)?;
        let mut steps = vec![parser.step()?];
        while parser.eat(&Token::Slash) {
            steps.push(parser.step()?);
        }
        parser.finish()?;
        Ok(Self {
            base: NodePath::root(),
            steps,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluate against `tree`, returning matches in document order.
    pub fn evaluate(&self, tree: &Tree) -> Vec<NodePath> {
        let Some(base) = tree.node(&self.base) else {
            return Vec::new();
        };

        let mut context: Vec<(&Node, NodePath)> = vec![(base, self.base.clone())];
        for step in &self.steps {
            let mut next = Vec::new();
            for (node, path) in context {
                let candidates = (0..node.children().len()).collect();
                for idx in step.select(node, candidates) {
                    let child = &node.children()[idx];
                    next.push((child, path.nth(child.label(), node.rank_of(idx))));
                }
            }
            context = next;
        }
        context.into_iter().map(|(_, path)| path).collect()
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.base.is_root() {
            write!(f, "{}/", self.base)?;
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Star,
    Slash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Eq,
    Ne,
    Axis,
    LabelFn,
    LastFn,
    Word(String),
    Literal(String),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '#' | '%')
}

fn lex(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' | '/' | '[' | ']' | '(' | ')' | '=' => {
                chars.next();
                tokens.push(match c {
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Eq,
                });
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(Error::invalid_query(text, "expected '=' after '!'"));
                }
                tokens.push(Token::Ne);
            }
            ':' => {
                chars.next();
                if chars.next() != Some(':') {
                    return Err(Error::invalid_query(text, "expected '::'"));
                }
                tokens.push(Token::Axis);
            }
            '\'' | '"' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == c => break,
                        Some(ch) => literal.push(ch),
                        None => {
                            return Err(Error::invalid_query(text, "unterminated string literal"));
                        }
                    }
                }
                tokens.push(Token::Literal(literal));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if !is_word_char(ch) {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                let is_call = chars.peek() == Some(&'(');
                match word.as_str() {
                    "label" | "last" if is_call => {
                        chars.next();
                        if chars.next() != Some(')') {
                            return Err(Error::invalid_query(text, format!("expected '{word}()'")));
                        }
                        tokens.push(if word == "label" {
                            Token::LabelFn
                        } else {
                            Token::LastFn
                        });
                    }
                    _ => tokens.push(Token::Word(word)),
                }
            }
            other => {
                return Err(Error::invalid_query(
                    text,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        Ok(Self {
            text,
            tokens: lex(text)?,
            pos: 0,
        })
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::invalid_query(self.text, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected trailing {token:?}"))),
        }
    }

    fn step(&mut self) -> Result<Step> {
        let name = match self.next() {
            Some(Token::Star) => NameTest::Any,
            Some(Token::Word(label)) => NameTest::Label(label),
            _ => return Err(self.error("expected '*' or a label")),
        };

        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.predicate()?);
            self.expect(Token::RBracket, "']'")?;
        }
        Ok(Step { name, predicates })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        if self.eat(&Token::LastFn) {
            return Ok(Predicate::Position(Position::Last));
        }
        let index = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Word(word)), Some(Token::RBracket)) => word.parse::<usize>().ok(),
            _ => None,
        };
        if let Some(n) = index {
            if n == 0 {
                return Err(self.error("positions start at 1"));
            }
            self.pos += 1;
            return Ok(Predicate::Position(Position::Index(n)));
        }
        Ok(Predicate::Expr(self.or_expr()?))
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut terms = vec![self.and_expr()?];
        while self.eat_keyword("or") {
            terms.push(self.and_expr()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut terms = vec![self.primary()?];
        while self.eat_keyword("and") {
            terms.push(self.primary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.eat(&Token::LParen) {
            let expr = self.or_expr()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(expr);
        }

        let operand = match self.next() {
            Some(Token::LabelFn) => Operand::Label,
            Some(Token::Word(word)) => {
                if self.eat(&Token::Axis) {
                    let axis = match word.as_str() {
                        "following-sibling" => Axis::FollowingSibling,
                        "preceding-sibling" => Axis::PrecedingSibling,
                        other => return Err(self.error(format!("unsupported axis '{other}'"))),
                    };
                    let step = self.step()?;
                    return Ok(Expr::Sibling {
                        axis,
                        step: Box::new(step),
                    });
                }
                Operand::Field(word)
            }
            _ => return Err(self.error("expected a field, label() or an axis")),
        };

        let op = if self.eat(&Token::Eq) {
            CompareOp::Eq
        } else if self.eat(&Token::Ne) {
            CompareOp::Ne
        } else {
            return match operand {
                Operand::Field(field) => Ok(Expr::Exists(field)),
                Operand::Label => Err(self.error("label() must be compared")),
            };
        };

        match self.next() {
            Some(Token::Literal(value)) => Ok(Expr::Compare { operand, op, value }),
            _ => Err(self.error("expected a quoted value")),
        }
    }
}
