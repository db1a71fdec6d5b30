use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::{ComparisonOp, Expr, LogicalOp, Statement};
use crate::parser::error::convert_pest_error;
use crate::parser::{ParseError, ParseErrorKind, Span};
use crate::value::Value;

#[derive(Parser)]
#[grammar = "expression/grammar.pest"]
pub struct ExpressionParser;

type Result<T> = core::result::Result<T, ParseError>;

pub(super) fn parse(source: &str) -> Result<Statement> {
    let pairs = ExpressionParser::parse(Rule::input, source)
        .map_err(|err| convert_pest_error(err, source, describe))?;

    let builder = Builder { source };
    for pair in pairs.flat_map(|input| input.into_inner()) {
        match pair.as_rule() {
            Rule::statement => return builder.statement(pair),
            Rule::filtered => return Ok(Statement::Expr(builder.filtered(pair)?)),
            _ => {}
        }
    }
    // `input` always holds a statement or an expression.
    unreachable!("empty parse tree for {:?}", source)
}

struct Builder<'s> {
    source: &'s str,
}

impl Builder<'_> {
    fn statement(&self, pair: Pair<'_, Rule>) -> Result<Statement> {
        // statement > assign > (kw_assign, identifier, filtered)
        let mut parts = pair.into_inner().flat_map(|assign| assign.into_inner());
        let mut name = String::new();
        for part in parts.by_ref() {
            if part.as_rule() == Rule::identifier {
                name = part.as_str().to_string();
                break;
            }
        }
        match parts.next() {
            Some(value) => Ok(Statement::Assign {
                name,
                value: self.filtered(value)?,
            }),
            None => unreachable!("assign without a value"),
        }
    }

    fn filtered(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut parts = pair.into_inner();
        let mut expr = match parts.next() {
            Some(logical) => self.logical(logical)?,
            None => unreachable!("filtered without an operand"),
        };
        for filter in parts {
            let mut inner = filter.into_inner();
            let name = inner
                .next()
                .map(|ident| ident.as_str().to_string())
                .unwrap_or_default();
            let args = inner.map(|arg| self.logical(arg)).collect::<Result<Vec<_>>>()?;
            expr = Expr::Filter {
                input: Box::new(expr),
                name,
                args,
            };
        }
        Ok(expr)
    }

    /// `and` / `or` group to the right: `a and b or c` is `a and (b or c)`.
    fn logical(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::logical_op => ops.push(match part.as_str() {
                    "and" => LogicalOp::And,
                    _ => LogicalOp::Or,
                }),
                _ => operands.push(self.comparison(part)?),
            }
        }

        let mut expr = match operands.pop() {
            Some(last) => last,
            None => unreachable!("logical without operands"),
        };
        while let (Some(op), Some(left)) = (ops.pop(), operands.pop()) {
            expr = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn comparison(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut parts = pair.into_inner();
        let left = match parts.next() {
            Some(operand) => self.operand(operand)?,
            None => unreachable!("comparison without operands"),
        };
        let (Some(op), Some(right)) = (parts.next(), parts.next()) else {
            return Ok(left);
        };
        let op = match op.as_str() {
            "==" => ComparisonOp::Eq,
            "!=" | "<>" => ComparisonOp::Ne,
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::Le,
            ">" => ComparisonOp::Gt,
            ">=" => ComparisonOp::Ge,
            _ => ComparisonOp::Contains,
        };
        Ok(Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(self.operand(right)?),
        })
    }

    fn operand(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        match pair.as_rule() {
            Rule::range => {
                let mut bounds = pair.into_inner();
                match (bounds.next(), bounds.next()) {
                    (Some(start), Some(end)) => Ok(Expr::Range(
                        Box::new(self.operand(start)?),
                        Box::new(self.operand(end)?),
                    )),
                    _ => unreachable!("range without two bounds"),
                }
            }
            Rule::group => match pair.into_inner().next() {
                Some(inner) => self.filtered(inner),
                None => unreachable!("empty group"),
            },
            Rule::integer => match pair.as_str().parse::<i64>() {
                Ok(i) => Ok(Expr::Literal(Value::Int(i))),
                Err(_) => Err(self.invalid_number(&pair)),
            },
            Rule::float => match pair.as_str().parse::<f64>() {
                Ok(x) => Ok(Expr::Literal(Value::Float(x))),
                Err(_) => Err(self.invalid_number(&pair)),
            },
            Rule::string => {
                let text = pair.into_inner().next().map(|chars| chars.as_str()).unwrap_or("");
                Ok(Expr::Literal(Value::from(text)))
            }
            Rule::kw_true => Ok(Expr::Literal(Value::Bool(true))),
            Rule::kw_false => Ok(Expr::Literal(Value::Bool(false))),
            Rule::kw_nil => Ok(Expr::Literal(Value::Nil)),
            Rule::path => self.path(pair),
            rule => unreachable!("unexpected operand {:?}", rule),
        }
    }

    fn path(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut parts = pair.into_inner();
        let mut expr = match parts.next() {
            Some(ident) => Expr::Variable(ident.as_str().to_string()),
            None => unreachable!("path without a root"),
        };
        for part in parts {
            expr = match part.as_rule() {
                Rule::field => {
                    let name = part.into_inner().as_str().to_string();
                    Expr::Field(Box::new(expr), name)
                }
                _ => match part.into_inner().next() {
                    Some(key) => Expr::Index(Box::new(expr), Box::new(self.filtered(key)?)),
                    None => unreachable!("empty index"),
                },
            };
        }
        Ok(expr)
    }

    fn invalid_number(&self, pair: &Pair<'_, Rule>) -> ParseError {
        ParseError::new(
            ParseErrorKind::InvalidNumber {
                text: pair.as_str().to_string(),
            },
            self.source,
            Span::from(pair.as_span()),
        )
    }
}

fn describe(rule: &Rule) -> Option<&'static str> {
    match rule {
        Rule::integer | Rule::float | Rule::string | Rule::kw_true | Rule::kw_false | Rule::kw_nil => {
            Some("literal")
        }
        Rule::range | Rule::group | Rule::path | Rule::identifier | Rule::filtered | Rule::logical => {
            Some("expression")
        }
        Rule::comparison_op => Some("comparison operator"),
        Rule::logical_op => Some("`and` or `or`"),
        Rule::filter => Some("filter"),
        Rule::index | Rule::field => Some("property access"),
        Rule::EOI => Some("end of input"),
        _ => None,
    }
}
