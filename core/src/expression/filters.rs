//! Standard filters.
//!
//! | filter       | example                              | result     |
//! |--------------|--------------------------------------|------------|
//! | `append`     | `"a" \| append: "b"`                 | `"ab"`     |
//! | `prepend`    | `"b" \| prepend: "a"`                | `"ab"`     |
//! | `upcase`     | `"ab" \| upcase`                     | `"AB"`     |
//! | `downcase`   | `"AB" \| downcase`                   | `"ab"`     |
//! | `capitalize` | `"ab" \| capitalize`                 | `"Ab"`     |
//! | `strip`      | `" a " \| strip`                     | `"a"`      |
//! | `size`       | `"abc" \| size`                      | `3`        |
//! | `first`      | `list \| first`                      | first item |
//! | `last`       | `list \| last`                       | last item  |
//! | `join`       | `list \| join: ", "`                 | string     |
//! | `reverse`    | `list \| reverse`                    | array      |
//! | `default`    | `missing \| default: "x"`            | `"x"`      |
//! | `plus`       | `1 \| plus: 2`                       | `3`        |
//! | `minus`      | `3 \| minus: 2`                      | `1`        |
//! | `times`      | `2 \| times: 1.5`                    | `3.0`      |
//! | `divided_by` | `7 \| divided_by: 2`                 | `3`        |
//!
//! String filters accept any input and work on its rendered text.

use ecow::{EcoString, EcoVec};

use super::{EvalError, ExpressionConfig};
use crate::value::Value;

type Result = core::result::Result<Value, EvalError>;

pub(crate) fn register_standard_filters(config: &mut ExpressionConfig) {
    config
        .add_filter("append", |input, args| {
            let suffix = arg(args, 0, "append")?;
            Ok(Value::from(format!("{}{}", input, suffix)))
        })
        .add_filter("prepend", |input, args| {
            let prefix = arg(args, 0, "prepend")?;
            Ok(Value::from(format!("{}{}", prefix, input)))
        })
        .add_filter("upcase", |input, _| Ok(Value::from(input.to_string().to_uppercase())))
        .add_filter("downcase", |input, _| {
            Ok(Value::from(input.to_string().to_lowercase()))
        })
        .add_filter("capitalize", |input, _| Ok(Value::from(capitalize(&input.to_string()))))
        .add_filter("strip", |input, _| Ok(Value::from(input.to_string().trim())))
        .add_filter("size", |input, _| Ok(Value::from(input.size())))
        .add_filter("first", |input, _| Ok(input.field("first")))
        .add_filter("last", |input, _| Ok(input.field("last")))
        .add_filter("join", join)
        .add_filter("reverse", reverse)
        .add_filter("default", |input, args| {
            let fallback = arg(args, 0, "default")?;
            Ok(if input.is_blank() {
                fallback.clone()
            } else {
                input.clone()
            })
        })
        .add_filter("plus", |input, args| {
            arithmetic("plus", input, args, i64::checked_add, |a, b| a + b)
        })
        .add_filter("minus", |input, args| {
            arithmetic("minus", input, args, i64::checked_sub, |a, b| a - b)
        })
        .add_filter("times", |input, args| {
            arithmetic("times", input, args, i64::checked_mul, |a, b| a * b)
        })
        .add_filter("divided_by", divided_by);
}

fn arg<'a>(args: &'a [Value], i: usize, filter: &str) -> core::result::Result<&'a Value, EvalError> {
    args.get(i).ok_or_else(|| {
        EvalError::filter_argument(filter, format!("expected at least {} argument(s)", i + 1))
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join(input: &Value, args: &[Value]) -> Result {
    let separator = match args.first() {
        Some(sep) => sep.to_string(),
        None => " ".to_string(),
    };
    match input {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Ok(Value::from(parts.join(&separator)))
        }
        other => Ok(Value::from(other.to_string())),
    }
}

fn reverse(input: &Value, _: &[Value]) -> Result {
    match input {
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        Value::Str(s) => Ok(Value::Str(s.chars().rev().collect::<EcoString>())),
        Value::Nil => Ok(Value::Array(EcoVec::new())),
        other => Err(EvalError::filter_argument(
            "reverse",
            format!("cannot reverse {}", other.type_name()),
        )),
    }
}

/// Integer arithmetic when both sides are ints, float arithmetic otherwise.
fn arithmetic(
    filter: &str,
    input: &Value,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result {
    let (a, b) = operands(filter, input, arg(args, 0, filter)?)?;
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| EvalError::filter_argument(filter, "integer overflow")),
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => unreachable!("operands are numeric"),
        },
    }
}

fn divided_by(input: &Value, args: &[Value]) -> Result {
    let (a, b) = operands("divided_by", input, arg(args, 0, "divided_by")?)?;
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            let quotient = a
                .checked_div(b)
                .ok_or_else(|| EvalError::filter_argument("divided_by", "integer overflow"))?;
            // Integer division floors.
            let floored = if a % b != 0 && (a < 0) != (b < 0) {
                quotient - 1
            } else {
                quotient
            };
            Ok(Value::Int(floored))
        }
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(_), Some(b)) if b == 0.0 => Err(EvalError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => unreachable!("operands are numeric"),
        },
    }
}

/// Coerce both sides to numbers; `nil` counts as zero and numeric strings parse.
fn operands(
    filter: &str,
    input: &Value,
    arg: &Value,
) -> core::result::Result<(Value, Value), EvalError> {
    Ok((number(filter, input)?, number(filter, arg)?))
}

fn number(filter: &str, value: &Value) -> core::result::Result<Value, EvalError> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        Value::Nil => Ok(Value::Int(0)),
        Value::Str(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Int(i))
            } else if let Ok(x) = s.parse::<f64>() {
                Ok(Value::Float(x))
            } else {
                Err(EvalError::filter_argument(
                    filter,
                    format!("`{}` is not a number", s),
                ))
            }
        }
        other => Err(EvalError::filter_argument(
            filter,
            format!("expected a number, got {}", other.type_name()),
        )),
    }
}
