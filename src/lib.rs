//! Stencil - A small, embeddable template engine
//!
//! # Overview
//!
//! Stencil renders Liquid-style templates: literal text, `{{ expressions }}`
//! with filters, and `{% tags %}` that control flow, bind variables and
//! include other files. Hosts register their own tags and filters.
//!
//! # Quick Start
//!
//! ```
//! use stencil::{Bindings, Engine, EngineOptions, Value};
//!
//! let engine = Engine::new(EngineOptions::default(), |config| {
//!     config.expression_mut().add_filter("initial", |input, _| {
//!         Ok(input.field("first"))
//!     });
//! });
//!
//! let data: Value = serde_json::from_str(r#"{"people": ["Ada", "Grace"]}"#).unwrap();
//! let Value::Map(map) = data else { unreachable!() };
//! let bindings: Bindings = map.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
//!
//! let out = engine
//!     .render_string("{% for p in people %}{{ p | initial }}{% endfor %}", bindings)
//!     .unwrap();
//! assert_eq!(out, "AG");
//! ```
//!
//! # Custom tags
//!
//! A tag is a function of a [`RenderContext`] and an output sink. Block tags
//! declare the clause tags that may split their body:
//!
//! ```
//! use stencil::{Bindings, Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default(), |config| {
//!     config.add_block("repeat", &[], |ctx, out| {
//!         let times = ctx.evaluate_string(ctx.tag_args())?.as_int().unwrap_or(0);
//!         for _ in 0..times {
//!             ctx.render_children(out)?;
//!         }
//!         Ok(())
//!     });
//! });
//!
//! let out = engine.render_string("{% repeat 3 %}ab{% endrepeat %}", Bindings::new()).unwrap();
//! assert_eq!(out, "ababab");
//! ```

// Re-export public API from stencil_core
pub use stencil_core::api::{Engine, EngineOptions, Template};

// Re-export the render core and its data types
pub use stencil_core::bindings::Bindings;
pub use stencil_core::expression::{self, EvalError, ExpressionConfig};
pub use stencil_core::parser::{self, Node, ParseError, ParseErrorKind};
pub use stencil_core::render::{self, Config, NodeContext, RenderContext, RenderError, Tag};
pub use stencil_core::value::Value;

mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
