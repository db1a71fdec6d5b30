//! The render core.
//!
//! [`render`] walks a parsed template left to right: text is written
//! verbatim, `{{ objects }}` are evaluated and displayed, and every tag node is
//! dispatched by name to a [`Tag`] registered in the [`Config`]. A tag receives
//! a [`RenderContext`] that lets it read its arguments, evaluate expressions,
//! read and write bindings, and render its body, its clauses or other files.
//!
//! ```
//! use stencil_core::bindings::Bindings;
//! use stencil_core::render::{self, Config, NodeContext};
//!
//! let config = Config::standard();
//! let nodes = config.parse("A{% assign x = 1 %}B{{ x }}").unwrap();
//!
//! let mut ctx = NodeContext::new(Bindings::new(), &config);
//! let mut out = Vec::new();
//! render::render(&mut out, &nodes, &mut ctx).unwrap();
//! assert_eq!(out, b"AB1");
//! ```

mod config;
mod context;
mod error;
mod node_context;
mod tags;

#[cfg(test)]
mod context_test;

use std::io::Write;

pub use config::{Config, DEFAULT_MAX_INCLUDE_DEPTH};
pub use context::{Current, RenderContext};
pub use error::RenderError;
pub use node_context::NodeContext;

use crate::parser::Node;

pub type Result<T> = core::result::Result<T, RenderError>;

/// Render behavior of one tag name.
///
/// Closures with the signature of [`Tag::render`] implement this trait, so
/// most tags are registered with [`Config::add_tag`] or [`Config::add_block`].
pub trait Tag: Send + Sync {
    fn render(&self, ctx: &mut RenderContext<'_, '_>, out: &mut dyn Write) -> Result<()>;
}

impl<F> Tag for F
where
    F: Fn(&mut RenderContext<'_, '_>, &mut dyn Write) -> Result<()> + Send + Sync,
{
    fn render(&self, ctx: &mut RenderContext<'_, '_>, out: &mut dyn Write) -> Result<()> {
        self(ctx, out)
    }
}

/// Render `nodes` into `out` with the bindings and configuration of `ctx`.
pub fn render(out: &mut dyn Write, nodes: &[Node], ctx: &mut NodeContext<'_>) -> Result<()> {
    ctx.render_nodes(out, nodes)
}

/// Render `nodes` into a string.
pub fn render_to_string(nodes: &[Node], ctx: &mut NodeContext<'_>) -> Result<String> {
    let mut buf = Vec::new();
    ctx.render_nodes(&mut buf, nodes)?;
    Ok(into_string(buf))
}

/// Rendered bytes as text. Output is normally UTF-8; anything else is
/// replaced rather than rejected.
pub(crate) fn into_string(buf: Vec<u8>) -> String {
    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
