//! Tree-walking evaluation of [`Expr`].

use core::cmp::Ordering;

use ecow::EcoVec;
use tracing::trace;

use super::{ComparisonOp, Context, EvalError, Expr, LogicalOp};
use crate::value::Value;

/// Largest number of elements a range literal may produce.
const MAX_RANGE_LEN: i64 = 1 << 20;

pub(super) struct Evaluator<'c> {
    ctx: Context<'c>,
}

impl<'c> Evaluator<'c> {
    pub(super) fn new(ctx: &Context<'c>) -> Self {
        Self { ctx: *ctx }
    }

    pub(super) fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => Ok(self.ctx.bindings.get(name).cloned().unwrap_or_default()),
            Expr::Field(target, name) => Ok(self.eval(target)?.field(name)),
            Expr::Index(target, key) => {
                let target = self.eval(target)?;
                Ok(target.index(&self.eval(key)?))
            }
            Expr::Range(start, end) => {
                let start = range_bound(self.eval(start)?)?;
                let end = range_bound(self.eval(end)?)?;
                range(start, end)
            }
            Expr::Comparison { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                compare(*op, &left, &right).map(Value::Bool)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?.is_truthy();
                let result = match op {
                    LogicalOp::And => left && self.eval(right)?.is_truthy(),
                    LogicalOp::Or => left || self.eval(right)?.is_truthy(),
                };
                Ok(Value::Bool(result))
            }
            Expr::Filter { input, name, args } => {
                let filter = self
                    .ctx
                    .config
                    .filter(name)
                    .ok_or_else(|| EvalError::UndefinedFilter(name.clone()))?;
                let input = self.eval(input)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                trace!(filter = %name, args = args.len(), "applying filter");
                filter(&input, &args)
            }
        }
    }
}

fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let ordering = match op {
        ComparisonOp::Eq => return Ok(left.loose_eq(right)),
        ComparisonOp::Ne => return Ok(!left.loose_eq(right)),
        ComparisonOp::Contains => return Ok(left.contains(right)),
        _ => left.compare(right),
    };
    let Some(ordering) = ordering else {
        // Ordering against nil is false rather than an error, so that
        // `{% if missing > 0 %}` quietly skips.
        if left.is_nil() || right.is_nil() {
            return Ok(false);
        }
        return Err(EvalError::Incomparable {
            op,
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    Ok(match op {
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}

fn range_bound(value: Value) -> Result<i64, EvalError> {
    match &value {
        Value::Int(i) => Ok(*i),
        Value::Float(x) => Ok(x.trunc() as i64),
        Value::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| EvalError::InvalidRange(format!("`{}` is not an integer", s))),
        other => Err(EvalError::InvalidRange(format!(
            "bound must be an integer, got {}",
            other.type_name()
        ))),
    }
}

fn range(start: i64, end: i64) -> Result<Value, EvalError> {
    if end < start {
        return Ok(Value::Array(EcoVec::new()));
    }
    if end.saturating_sub(start) >= MAX_RANGE_LEN {
        return Err(EvalError::InvalidRange(format!(
            "({}..{}) has more than {} elements",
            start, end, MAX_RANGE_LEN
        )));
    }
    Ok(Value::Array((start..=end).map(Value::Int).collect()))
}
