//! The expression language embedded in templates.
//!
//! Expressions appear inside `{{ ... }}` objects and in tag arguments:
//!
//! ```text
//! user.name | upcase
//! items[0].price | times: 2
//! count > 3 and title contains "draft"
//! (1..5)
//! ```
//!
//! A source string may also hold a statement, written `%tag arguments`. The
//! only statement is `%assign name = expression`, which evaluates to a
//! one-entry map `{name: value}` that the caller merges into its scope.
//!
//! Evaluation never fails on missing data: unbound variables and missing
//! properties are `nil`. It does fail on undefined filters, bad filter
//! arguments and incomparable operands, see [`EvalError`].

mod error;
mod eval;
pub mod filters;
mod parser;

#[cfg(test)]
mod rule_valid_test;

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::bindings::Bindings;
use crate::parser::ParseError;
use crate::value::Value;

pub use error::{EvalError, ExpressionError};

/// Syntax tree of one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    /// `target.name`
    Field(Box<Expr>, String),
    /// `target[key]`
    Index(Box<Expr>, Box<Expr>),
    /// `(start..end)`, inclusive.
    Range(Box<Expr>, Box<Expr>),
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `input | name: args`
    Filter {
        input: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Contains => "contains",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expr),
    Assign { name: String, value: Expr },
}

/// A parsed expression or statement, ready to evaluate any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    statement: Statement,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            source: source.to_string(),
            statement: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn evaluate(&self, ctx: &Context<'_>) -> Result<Value, EvalError> {
        let evaluator = eval::Evaluator::new(ctx);
        match &self.statement {
            Statement::Expr(expr) => evaluator.eval(expr),
            Statement::Assign { name, value } => {
                let value = evaluator.eval(value)?;
                Ok([(name.as_str(), value)].into_iter().collect())
            }
        }
    }
}

/// Signature of a filter: the piped input and the evaluated arguments.
pub type Filter = dyn Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync;

/// Expression language configuration, shared read-only by every evaluation.
#[derive(Clone, Default)]
pub struct ExpressionConfig {
    filters: HashMap<String, Arc<Filter>>,
}

impl ExpressionConfig {
    /// A configuration without any filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration with the [standard filters](filters).
    pub fn standard() -> Self {
        let mut config = Self::new();
        filters::register_standard_filters(&mut config);
        config
    }

    /// Register a filter, replacing any filter with the same name.
    pub fn add_filter<F>(&mut self, name: &str, filter: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Arc::new(filter));
        self
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name).map(|filter| filter.as_ref())
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }
}

impl fmt::Debug for ExpressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.filter_names().collect();
        names.sort_unstable();
        f.debug_struct("ExpressionConfig")
            .field("filters", &names)
            .finish()
    }
}

/// What an expression is evaluated against: variable bindings and the
/// shared configuration.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub bindings: &'a Bindings,
    pub config: &'a ExpressionConfig,
}

impl<'a> Context<'a> {
    pub fn new(bindings: &'a Bindings, config: &'a ExpressionConfig) -> Self {
        Self { bindings, config }
    }
}

/// Parse and evaluate `source` in one step.
pub fn evaluate_string(source: &str, ctx: &Context<'_>) -> Result<Value, ExpressionError> {
    let expression = Expression::parse(source)?;
    Ok(expression.evaluate(ctx)?)
}
