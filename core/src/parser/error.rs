use core::fmt;

use pest::RuleType;
use pest::error::{ErrorVariant, InputLocation};
use thiserror::Error;

use crate::parser::Span;

/// Template or expression text that failed to parse.
///
/// Carries the full text that was being parsed and the span of the offending
/// part, so the error can be reported without access to the original file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The text being parsed (a template, tag arguments, or an expression).
    pub src: String,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// `{{` or `{%` without its closing delimiter
    UnclosedDelimiter { delimiter: &'static str },
    /// Tag name with no registered definition
    UndefinedTag { name: String },
    /// Clause tag (`else`, `elsif`, ...) outside a block that accepts it
    UnexpectedClause { name: String },
    /// `end<name>` that does not close the innermost open block
    UnmatchedEnd { name: String, open: Option<String> },
    /// Block still open at end of input
    UnclosedBlock { name: String },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, src: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            src: src.into(),
            span,
        }
    }

    /// Re-anchor an error raised on a fragment found at `offset` within `src`.
    pub(crate) fn relocate(mut self, src: &str, offset: usize) -> Self {
        self.span = Span::new(self.span.0.start + offset, self.span.0.end + offset);
        self.src = src.to_string();
        self
    }

    /// The offending part of the source, or the rest of its line when the
    /// span is empty.
    pub fn snippet(&self) -> &str {
        let start = self.span.0.start.min(self.src.len());
        let end = self.span.0.end.min(self.src.len());
        if start < end {
            return &self.src[start..end];
        }
        let rest = &self.src[start..];
        rest.split('\n').next().unwrap_or(rest)
    }

    pub fn message(&self) -> String {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ParseErrorKind::UnclosedDelimiter { delimiter } => {
                format!("unclosed delimiter, expected `{}`", delimiter)
            }
            ParseErrorKind::UndefinedTag { name } => format!("undefined tag `{}`", name),
            ParseErrorKind::UnexpectedClause { name } => {
                format!("`{}` is not valid here", name)
            }
            ParseErrorKind::UnmatchedEnd { name, open: Some(open) } => {
                format!("`{}` does not close `{}`", name, open)
            }
            ParseErrorKind::UnmatchedEnd { name, open: None } => {
                format!("`{}` without an open block", name)
            }
            ParseErrorKind::UnclosedBlock { name } => format!("`{}` block is never closed", name),
            ParseErrorKind::InvalidNumber { text } => format!("invalid number literal `{}`", text),
            ParseErrorKind::Other { message } => message.clone(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message())?;
        let snippet = self.snippet();
        if !snippet.is_empty() {
            write!(f, " at `{}`", snippet)?;
        }
        Ok(())
    }
}

/// Convert a Pest error into a [`ParseError`].
///
/// `describe` names a grammar rule in user terms; rules mapping to `None` are
/// dropped from the "expected" list.
pub(crate) fn convert_pest_error<R: RuleType>(
    err: pest::error::Error<R>,
    source: &str,
    describe: fn(&R) -> Option<&'static str>,
) -> ParseError {
    let span = match err.location {
        InputLocation::Pos(pos) => Span(pos..pos),
        InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => ParseErrorKind::UnexpectedToken {
            expected: format_rules(&positives, describe, "something else"),
            found: found_at(source, span.0.start, &negatives, describe),
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, source, span)
}

fn format_rules<R>(rules: &[R], describe: fn(&R) -> Option<&'static str>, empty: &str) -> String {
    let mut concepts: Vec<&str> = Vec::new();
    for name in rules.iter().filter_map(describe) {
        if !concepts.contains(&name) {
            concepts.push(name);
        }
    }
    match concepts.as_slice() {
        [] => empty.to_string(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

fn found_at<R>(
    source: &str,
    pos: usize,
    negatives: &[R],
    describe: fn(&R) -> Option<&'static str>,
) -> String {
    if !negatives.is_empty() {
        return format_rules(negatives, describe, "unexpected input");
    }
    match source.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("`{}`", c),
        None => "end of input".to_string(),
    }
}
