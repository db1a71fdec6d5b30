//! Public API for the Stencil template engine.
//!
//! # Example
//!
//! ```
//! use stencil_core::api::{Engine, EngineOptions};
//! use stencil_core::Bindings;
//!
//! let engine = Engine::new(EngineOptions::default(), |_config| {});
//! let template = engine.parse("{% for i in (1..3) %}{{ i }}{% endfor %}").unwrap();
//!
//! let out = engine.render_template(&template, Bindings::new()).unwrap();
//! assert_eq!(out, "123");
//! ```

pub mod engine;
pub mod options;
pub mod template;


pub use engine::Engine;
pub use options::EngineOptions;
pub use template::Template;
