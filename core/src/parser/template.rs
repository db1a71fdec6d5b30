//! Template parser: lexes with Pest, then nests tags into blocks.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::expression::Expression;
use crate::parser::ast::{Block, Chunk, Functional, Node, Object};
use crate::parser::error::convert_pest_error;
use crate::parser::{Grammar, ParseError, ParseErrorKind, Span, TagSyntax};

#[derive(Parser)]
#[grammar = "parser/template.pest"]
pub struct TemplateParser;

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Object {
        body: &'a str,
        /// Offset of `body` in the template source.
        offset: usize,
        span: Span,
    },
    Tag {
        name: &'a str,
        args: &'a str,
        span: Span,
    },
}

#[derive(Debug)]
struct Lexeme<'a> {
    token: Token<'a>,
    trim_left: bool,
    trim_right: bool,
}

/// Parse template source into a node sequence.
///
/// Tag names are resolved against `grammar`: functional tags become
/// [`Node::Functional`], block tags collect nodes until their `end<name>` tag,
/// and clause tags split the innermost open block that declares them.
pub fn parse(source: &str, grammar: &Grammar) -> Result<Vec<Node>, ParseError> {
    let mut lexemes = tokenize(source)?;
    apply_trim(&mut lexemes);
    build(source, lexemes, grammar)
}

fn tokenize(source: &str) -> Result<Vec<Lexeme<'_>>, ParseError> {
    let pairs =
        TemplateParser::parse(Rule::template, source).map_err(|err| lex_error(err, source))?;

    Ok(pairs
        .flat_map(|template| template.into_inner())
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(lexeme)
        .collect())
}

fn lexeme(pair: Pair<'_, Rule>) -> Lexeme<'_> {
    let rule = pair.as_rule();
    if rule == Rule::text {
        return Lexeme {
            token: Token::Text(pair.as_str()),
            trim_left: false,
            trim_right: false,
        };
    }

    let span = Span::from(pair.as_span());
    let (mut trim_left, mut trim_right) = (false, false);
    let (mut name, mut body, mut offset) = ("", "", span.0.start);
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::trim_open => trim_left = true,
            Rule::trim_close => trim_right = true,
            Rule::tag_name => name = part.as_str(),
            Rule::object_body | Rule::tag_args => {
                let raw = part.as_str();
                body = raw.trim();
                offset = part.as_span().start() + (raw.len() - raw.trim_start().len());
            }
            _ => {}
        }
    }

    let token = match rule {
        Rule::object => Token::Object { body, offset, span },
        _ => Token::Tag {
            name,
            args: body,
            span,
        },
    };
    Lexeme {
        token,
        trim_left,
        trim_right,
    }
}

/// Strip whitespace from text next to `{{-`, `-}}`, `{%-` and `-%}`.
fn apply_trim(lexemes: &mut [Lexeme<'_>]) {
    for i in 0..lexemes.len() {
        if lexemes[i].trim_left && i > 0 {
            if let Token::Text(text) = &mut lexemes[i - 1].token {
                *text = str::trim_end(*text);
            }
        }
        if lexemes[i].trim_right && i + 1 < lexemes.len() {
            if let Token::Text(text) = &mut lexemes[i + 1].token {
                *text = str::trim_start(*text);
            }
        }
    }
}

fn build(source: &str, lexemes: Vec<Lexeme<'_>>, grammar: &Grammar) -> Result<Vec<Node>, ParseError> {
    let mut root = Vec::new();
    let mut open: Vec<Block> = Vec::new();

    for lexeme in lexemes {
        match lexeme.token {
            Token::Text(text) => {
                if !text.is_empty() {
                    push(&mut open, &mut root, Node::Text(text.to_string()));
                }
            }
            Token::Object { body, offset, span } => {
                let expression =
                    Expression::parse(body).map_err(|err| err.relocate(source, offset))?;
                push(&mut open, &mut root, Node::Object(Object { expression, span }));
            }
            Token::Tag { name, args, span } => {
                let chunk = Chunk {
                    name: name.to_string(),
                    args: args.to_string(),
                    span,
                };
                match grammar.syntax(name) {
                    Some(TagSyntax::Functional) => {
                        push(&mut open, &mut root, Node::Functional(Functional { chunk }));
                    }
                    Some(TagSyntax::Block { .. }) => open.push(Block::new(chunk)),
                    None => close_or_split(source, grammar, &mut open, &mut root, chunk)?,
                }
            }
        }
    }

    match open.pop() {
        Some(block) => Err(ParseError::new(
            ParseErrorKind::UnclosedBlock {
                name: block.chunk.name,
            },
            source,
            block.chunk.span,
        )),
        None => Ok(root),
    }
}

/// Handle a tag that is not itself registered: an `end<name>` tag or a clause.
fn close_or_split(
    source: &str,
    grammar: &Grammar,
    open: &mut Vec<Block>,
    root: &mut Vec<Node>,
    chunk: Chunk,
) -> Result<(), ParseError> {
    if let Some(closed) = chunk.name.strip_prefix("end") {
        return match open.pop() {
            Some(block) if block.chunk.name == closed => {
                push(open, root, Node::Block(block));
                Ok(())
            }
            other => Err(ParseError::new(
                ParseErrorKind::UnmatchedEnd {
                    name: chunk.name.clone(),
                    open: other.map(|block| block.chunk.name),
                },
                source,
                chunk.span,
            )),
        };
    }

    match open.last_mut() {
        Some(block) if grammar.accepts_clause(&block.chunk.name, &chunk.name) => {
            block.clauses.push(Block::new(chunk));
            Ok(())
        }
        _ => {
            let kind = if grammar.is_clause(&chunk.name) {
                ParseErrorKind::UnexpectedClause { name: chunk.name }
            } else {
                ParseErrorKind::UndefinedTag { name: chunk.name }
            };
            Err(ParseError::new(kind, source, chunk.span))
        }
    }
}

fn push(open: &mut [Block], root: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(block) => block.current_body().push(node),
        None => root.push(node),
    }
}

fn lex_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    let pos = match err.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    match unclosed_delimiter(source, pos) {
        Some((start, delimiter)) => ParseError::new(
            ParseErrorKind::UnclosedDelimiter { delimiter },
            source,
            Span::new(start, source.len()),
        ),
        None => convert_pest_error(err, source, describe),
    }
}

/// Find an opening `{{` or `{%` at or before `pos` that is never closed.
fn unclosed_delimiter(source: &str, pos: usize) -> Option<(usize, &'static str)> {
    let rest = source.get(pos..)?;
    let opener = if rest.starts_with("{{") {
        Some((pos, "}}"))
    } else if rest.starts_with("{%") {
        Some((pos, "%}"))
    } else {
        let head = &source[..pos];
        match (head.rfind("{{"), head.rfind("{%")) {
            (Some(object), Some(tag)) if tag > object => Some((tag, "%}")),
            (Some(object), _) => Some((object, "}}")),
            (None, Some(tag)) => Some((tag, "%}")),
            (None, None) => None,
        }
    };
    let (start, close) = opener?;
    (!source[start + 2..].contains(close)).then_some((start, close))
}

fn describe(rule: &Rule) -> Option<&'static str> {
    match rule {
        Rule::object => Some("`{{`"),
        Rule::tag => Some("`{%`"),
        Rule::text => Some("text"),
        Rule::tag_name => Some("tag name"),
        Rule::EOI => Some("end of input"),
        _ => None,
    }
}
