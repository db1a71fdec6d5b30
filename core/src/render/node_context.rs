use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use super::{Current, RenderContext, RenderError, Result};
use crate::bindings::Bindings;
use crate::expression::{Context, EvalError, Expression, ExpressionError};
use crate::parser::Node;
use crate::render::Config;
use crate::value::Value;

/// A variable scope coupled with the shared configuration.
///
/// This is the state a render walks with. Tags see it through a
/// [`RenderContext`].
#[derive(Debug)]
pub struct NodeContext<'c> {
    bindings: Bindings,
    config: &'c Config,
    /// Number of `render_file` calls currently on the stack.
    pub(super) include_depth: usize,
}

impl<'c> NodeContext<'c> {
    pub fn new(bindings: Bindings, config: &'c Config) -> Self {
        Self {
            bindings,
            config,
            include_depth: 0,
        }
    }

    pub fn config(&self) -> &'c Config {
        self.config
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }

    /// Look up a variable; `None` if no enclosing scope binds it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bind a variable in this scope only.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.set(name, value);
    }

    /// A context for an inner scope: it reads through to this one and its
    /// writes stay private.
    pub fn clone_scope(&self) -> NodeContext<'c> {
        NodeContext {
            bindings: self.bindings.clone_scope(),
            config: self.config,
            include_depth: self.include_depth,
        }
    }

    /// Evaluate a parsed expression against the current bindings.
    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        let ctx = self.expression_context();
        guarded(expression.source(), || {
            expression.evaluate(&ctx).map_err(ExpressionError::from)
        })
    }

    /// Parse and evaluate `source` against the current bindings.
    pub fn evaluate_string(&self, source: &str) -> Result<Value> {
        let ctx = self.expression_context();
        guarded(source, || crate::expression::evaluate_string(source, &ctx))
    }

    fn expression_context(&self) -> Context<'_> {
        Context::new(&self.bindings, self.config.expression())
    }

    /// Render `nodes` in order. The first failing node aborts the rest.
    pub fn render_nodes(&mut self, out: &mut dyn Write, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.render_node(out, node)?;
        }
        Ok(())
    }

    fn render_node(&mut self, out: &mut dyn Write, node: &Node) -> Result<()> {
        match node {
            Node::Text(text) => {
                trace!(len = text.len(), "text");
                out.write_all(text.as_bytes())?;
            }
            Node::Object(object) => {
                trace!(expression = object.expression.source(), "object");
                let value = self.evaluate(&object.expression)?;
                write!(out, "{}", value)?;
            }
            Node::Functional(functional) => {
                self.render_tag(out, Current::Functional(functional))?;
            }
            Node::Block(block) => self.render_tag(out, Current::Block(block))?,
        }
        Ok(())
    }

    fn render_tag(&mut self, out: &mut dyn Write, current: Current<'_>) -> Result<()> {
        let chunk = current.chunk();
        let config = self.config;
        let tag = config
            .find_tag(&chunk.name)
            .ok_or_else(|| RenderError::UndefinedTag(chunk.name.clone()))?;
        debug!(tag = %chunk.name, args = %chunk.args, "rendering tag");
        let mut ctx = RenderContext::new(self, current);
        tag.render(&mut ctx, out).map_err(|error| error.within_tag(chunk))
    }
}

/// Run the expression evaluator behind a fault boundary.
///
/// Parse and evaluation errors come back as their `RenderError` kinds. A
/// panic inside the evaluator, which can only come from a defective filter,
/// becomes `UnexpectedFault` annotated with the expression text.
fn guarded<F>(expression: &str, evaluate: F) -> Result<Value>
where
    F: FnOnce() -> core::result::Result<Value, ExpressionError>,
{
    match panic::catch_unwind(AssertUnwindSafe(evaluate)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(ExpressionError::Parse(error))) => Err(RenderError::Parse(error)),
        Ok(Err(ExpressionError::Eval(error))) => Err(evaluation_error(expression, error)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(expression, %message, "fault during evaluation");
            Err(RenderError::UnexpectedFault {
                expression: expression.to_string(),
                message,
            })
        }
    }
}

fn evaluation_error(expression: &str, error: EvalError) -> RenderError {
    RenderError::Evaluation {
        expression: expression.to_string(),
        error,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
