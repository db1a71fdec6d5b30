//! Core of the Stencil template engine.
//!
//! - [`parser`] turns template source into a tree of [`parser::Node`]s.
//! - [`expression`] parses and evaluates the expressions inside `{{ }}` and
//!   tag arguments.
//! - [`bindings`] holds variables in chained lexical scopes.
//! - [`render`] walks a parsed template, dispatching tags through the
//!   registry in [`render::Config`].
//! - [`api`] wraps all of the above in an [`api::Engine`].

pub mod api;
pub mod bindings;
pub mod expression;
pub mod parser;
pub mod render;
pub mod value;

pub use bindings::Bindings;
pub use value::Value;
