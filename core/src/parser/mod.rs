pub mod ast;
pub mod error;
mod syntax;
mod template;

use hashbrown::HashMap;

pub use ast::{Block, Chunk, Functional, Node, Object};
pub use error::{ParseError, ParseErrorKind};
pub use syntax::Span;
pub use template::parse;

/// How a tag name is shaped in template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSyntax {
    /// `{% name args %}`
    Functional,
    /// `{% name args %} ... {% endname %}`, optionally split by clause tags.
    Block { clauses: Vec<String> },
}

/// The set of tag names a template may use, and their shapes.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    tags: HashMap<String, TagSyntax>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_functional(&mut self, name: &str) {
        self.tags.insert(name.to_string(), TagSyntax::Functional);
    }

    pub fn add_block(&mut self, name: &str, clauses: &[&str]) {
        let clauses = clauses.iter().map(|clause| clause.to_string()).collect();
        self.tags.insert(name.to_string(), TagSyntax::Block { clauses });
    }

    pub fn syntax(&self, name: &str) -> Option<&TagSyntax> {
        self.tags.get(name)
    }

    /// Whether `clause` may split a `block` tag.
    pub fn accepts_clause(&self, block: &str, clause: &str) -> bool {
        match self.tags.get(block) {
            Some(TagSyntax::Block { clauses }) => clauses.iter().any(|c| c == clause),
            _ => false,
        }
    }

    /// Whether any block declares `name` as a clause.
    pub fn is_clause(&self, name: &str) -> bool {
        self.tags.values().any(|syntax| match syntax {
            TagSyntax::Block { clauses } => clauses.iter().any(|c| c == name),
            TagSyntax::Functional => false,
        })
    }
}
