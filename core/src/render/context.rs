//! The interface a tag renders through.

use core::ops::{Deref, DerefMut};
use std::fs;
use std::io::Write;

use tracing::debug;

use super::{Config, NodeContext, RenderError, Result, into_string};
use crate::expression::Expression;
use crate::parser::{Block, Chunk, Functional};
use crate::value::Value;

/// The tag node a [`RenderContext`] was created for.
#[derive(Debug, Clone, Copy)]
pub enum Current<'r> {
    Functional(&'r Functional),
    Block(&'r Block),
}

impl<'r> Current<'r> {
    pub fn chunk(&self) -> &'r Chunk {
        match self {
            Current::Functional(functional) => &functional.chunk,
            Current::Block(block) => &block.chunk,
        }
    }
}

/// A node context that is either the caller's or a private inner scope.
#[derive(Debug)]
enum Scope<'r, 'c> {
    Borrowed(&'r mut NodeContext<'c>),
    Owned(NodeContext<'c>),
}

impl<'c> Deref for Scope<'_, 'c> {
    type Target = NodeContext<'c>;

    fn deref(&self) -> &Self::Target {
        match self {
            Scope::Borrowed(ctx) => ctx,
            Scope::Owned(ctx) => ctx,
        }
    }
}

impl DerefMut for Scope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Scope::Borrowed(ctx) => ctx,
            Scope::Owned(ctx) => ctx,
        }
    }
}

/// Everything one tag invocation can do.
///
/// Every operation acts on the scope the tag was rendered in, or on a private
/// inner scope after [`clone_scope`](Self::clone_scope).
#[derive(Debug)]
pub struct RenderContext<'r, 'c> {
    scope: Scope<'r, 'c>,
    current: Current<'r>,
}

impl<'r, 'c> RenderContext<'r, 'c> {
    pub(super) fn new(ctx: &'r mut NodeContext<'c>, current: Current<'r>) -> Self {
        Self {
            scope: Scope::Borrowed(ctx),
            current,
        }
    }

    pub fn current(&self) -> Current<'r> {
        self.current
    }

    pub fn tag_name(&self) -> &'r str {
        &self.current.chunk().name
    }

    /// The raw, unevaluated argument text.
    pub fn tag_args(&self) -> &'r str {
        &self.current.chunk().args
    }

    /// The current block node, so block tags can reach their clauses. `None`
    /// for functional tags.
    pub fn block(&self) -> Option<&'r Block> {
        match self.current {
            Current::Block(block) => Some(block),
            Current::Functional(_) => None,
        }
    }

    pub fn config(&self) -> &'c Config {
        self.scope.config()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.scope.set(name, value);
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        self.scope.evaluate(expression)
    }

    /// Parse `source` as an expression and evaluate it now.
    ///
    /// Evaluation failures are returned as [`RenderError::Evaluation`]; a
    /// panic raised by a filter is caught and returned as
    /// [`RenderError::UnexpectedFault`] naming `source`.
    pub fn evaluate_string(&self, source: &str) -> Result<Value> {
        self.scope.evaluate_string(source)
    }

    /// Evaluate `source` as the statement `%tag source`.
    pub fn evaluate_statement(&self, tag: &str, source: &str) -> Result<Value> {
        self.evaluate_string(&format!("%{} {}", tag, source))
    }

    /// The argument text, with `{{ }}` interpolations rendered against the
    /// current bindings.
    pub fn parse_tag_args(&mut self) -> Result<String> {
        let args = self.tag_args();
        if !args.contains("{{") {
            return Ok(args.to_string());
        }
        let nodes = self.config().parse(args)?;
        let mut buf = Vec::new();
        self.scope.render_nodes(&mut buf, &nodes)?;
        Ok(into_string(buf))
    }

    /// Render the body of `block`, which need not be the current node.
    pub fn render_child(&mut self, out: &mut dyn Write, block: &Block) -> Result<()> {
        self.scope.render_nodes(out, &block.body)
    }

    /// Render the current block's body. Does nothing for functional tags.
    pub fn render_children(&mut self, out: &mut dyn Write) -> Result<()> {
        match self.current {
            Current::Block(block) => self.scope.render_nodes(out, &block.body),
            Current::Functional(_) => Ok(()),
        }
    }

    /// The current block's body rendered to a string.
    pub fn inner_string(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        self.render_children(&mut buf)?;
        Ok(into_string(buf))
    }

    /// Read, parse and render a template file with the current bindings.
    ///
    /// Relative paths resolve against [`Config::include_root`]. The file sees
    /// and may change the bindings of the including scope.
    pub fn render_file(&mut self, path: &str) -> Result<String> {
        let config = self.config();
        let path = config.resolve_path(path);
        if self.scope.include_depth >= config.max_include_depth() {
            return Err(RenderError::IncludeDepth {
                path,
                max_depth: config.max_include_depth(),
            });
        }

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) => return Err(RenderError::Io { path, error }),
        };
        let nodes = match config.parse(&source) {
            Ok(nodes) => nodes,
            Err(error) => return Err(RenderError::FileParse { path, error }),
        };

        debug!(path = %path.display(), depth = self.scope.include_depth, "rendering file");
        let mut buf = Vec::new();
        self.scope.include_depth += 1;
        let result = self.scope.render_nodes(&mut buf, &nodes);
        self.scope.include_depth -= 1;
        match result {
            Ok(()) => Ok(into_string(buf)),
            Err(error) => Err(RenderError::FileRender {
                path,
                error: Box::new(error),
            }),
        }
    }

    /// Merge `bindings` into the scope this context was created with.
    ///
    /// Unlike [`clone_scope`](Self::clone_scope), the writes are visible to
    /// the nodes that follow the tag.
    pub fn update_bindings<I, K, V>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.scope.bindings_mut().update(bindings);
    }

    /// A context for the same tag over a private inner scope.
    pub fn clone_scope(&self) -> RenderContext<'r, 'c> {
        RenderContext {
            scope: Scope::Owned(self.scope.clone_scope()),
            current: self.current,
        }
    }
}
