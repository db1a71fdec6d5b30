//! Template syntax tree.
//!
//! Produced by [`parse`](super::parse) and only ever read by the renderer, so
//! a parsed tree can be rendered any number of times.

use crate::expression::Expression;
use crate::parser::Span;

/// One node of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, written verbatim.
    Text(String),
    /// `{{ expression }}`
    Object(Object),
    /// A tag without a body: `{% name args %}`.
    Functional(Functional),
    /// A tag with a body: `{% name args %} ... {% endname %}`.
    Block(Block),
}

/// The opening tag of a functional or block node.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub name: String,
    /// Raw, unevaluated argument text, trimmed of surrounding whitespace.
    pub args: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Functional {
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub chunk: Chunk,
    pub body: Vec<Node>,
    /// Clause blocks (`elsif`, `else`, ...) in source order. Each clause owns
    /// the nodes between it and the next clause or the end tag.
    pub clauses: Vec<Block>,
}

impl Block {
    pub fn new(chunk: Chunk) -> Self {
        Self {
            chunk,
            body: Vec::new(),
            clauses: Vec::new(),
        }
    }

    /// First clause with the given tag name.
    pub fn clause(&self, name: &str) -> Option<&Block> {
        self.clauses.iter().find(|clause| clause.chunk.name == name)
    }

    /// Where nodes parsed next belong: the last clause, or the main body.
    pub(crate) fn current_body(&mut self) -> &mut Vec<Node> {
        match self.clauses.last_mut() {
            Some(clause) => &mut clause.body,
            None => &mut self.body,
        }
    }
}
