//! Rendering errors.
//!
//! Rendering is fail-fast: the first error aborts the rest of the node
//! sequence and propagates to the caller unchanged in kind. Bytes already
//! written to the output stay written.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::expression::EvalError;
use crate::parser::{Chunk, ParseError};

#[derive(Debug, Error)]
pub enum RenderError {
    /// Template or tag argument text failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A well-formed expression could not be evaluated.
    #[error("{error} in `{expression}`")]
    Evaluation { expression: String, error: EvalError },

    /// A filter or tag panicked while `expression` was being evaluated.
    #[error("unexpected fault during evaluation of `{expression}`: {message}")]
    UnexpectedFault { expression: String, message: String },

    #[error("cannot read `{}`: {}", .path.display(), .error)]
    Io { path: PathBuf, error: io::Error },

    #[error("in `{}`: {}", .path.display(), .error)]
    FileParse { path: PathBuf, error: ParseError },

    #[error("in `{}`: {}", .path.display(), .error)]
    FileRender {
        path: PathBuf,
        error: Box<RenderError>,
    },

    /// The output sink failed.
    #[error("output error: {0}")]
    Write(#[from] io::Error),

    #[error("undefined tag `{0}`")]
    UndefinedTag(String),

    /// Context for an error raised while rendering a tag.
    #[error("in `{{% {name} {args} %}}`: {error}")]
    Tag {
        name: String,
        args: String,
        error: Box<RenderError>,
    },

    #[error("include depth exceeds {max_depth} at `{}`", .path.display())]
    IncludeDepth { path: PathBuf, max_depth: usize },

    /// A tag rejected its argument text.
    #[error("invalid arguments to `{tag}`: {message}")]
    Argument { tag: String, message: String },
}

impl RenderError {
    pub fn argument(tag: &str, message: impl Into<String>) -> Self {
        RenderError::Argument {
            tag: tag.to_string(),
            message: message.into(),
        }
    }

    /// Attach the tag being rendered, unless a nested tag already did.
    pub(crate) fn within_tag(self, chunk: &Chunk) -> Self {
        match self {
            RenderError::Tag { .. } => self,
            error => RenderError::Tag {
                name: chunk.name.clone(),
                args: chunk.args.clone(),
                error: Box::new(error),
            },
        }
    }

    /// The error underneath any tag and file context.
    pub fn innermost(&self) -> &RenderError {
        match self {
            RenderError::Tag { error, .. } | RenderError::FileRender { error, .. } => {
                error.innermost()
            }
            _ => self,
        }
    }

    /// The parse error at the root of this error, if any.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self.innermost() {
            RenderError::Parse(error) | RenderError::FileParse { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The file whose rendering failed, innermost first.
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            RenderError::Tag { error, .. } => error.file(),
            RenderError::FileRender { path, error } => error.file().or(Some(path)),
            RenderError::Io { path, .. }
            | RenderError::FileParse { path, .. }
            | RenderError::IncludeDepth { path, .. } => Some(path),
            _ => None,
        }
    }
}
