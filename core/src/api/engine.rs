//! The Stencil rendering engine.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::{EngineOptions, Template};
use crate::bindings::Bindings;
use crate::parser::ParseError;
use crate::render::{self, Config, NodeContext, RenderError};

/// The Stencil parsing and rendering engine.
///
/// The engine owns a [`Config`]: the tag registry, the filter table and the
/// include settings. It is `Send + Sync`; every render gets its own scope.
///
/// # Example
///
/// ```
/// use stencil_core::api::{Engine, EngineOptions};
/// use stencil_core::{Bindings, Value};
///
/// let engine = Engine::new(EngineOptions::default(), |config| {
///     config.expression_mut().add_filter("shout", |input, _| {
///         Ok(Value::from(format!("{}!", input)))
///     });
/// });
///
/// let bindings: Bindings = [("name", "Ada")].into_iter().collect();
/// let out = engine.render_string("Hi {{ name | shout }}", bindings).unwrap();
/// assert_eq!(out, "Hi Ada!");
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    options: EngineOptions,
}

impl Engine {
    /// Create a new engine.
    ///
    /// The initialization closure receives the configuration built from
    /// `options` and may register tags and filters.
    pub fn new(options: EngineOptions, init: impl FnOnce(&mut Config)) -> Self {
        let mut config = if options.standard_library {
            Config::standard()
        } else {
            Config::new()
        };
        if let Some(root) = &options.include_root {
            config.set_include_root(root);
        }
        config.set_max_include_depth(options.max_include_depth);
        init(&mut config);

        Self { config, options }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse a template.
    pub fn parse(&self, source: &str) -> Result<Template, ParseError> {
        let nodes = self.config.parse(source)?;
        Ok(Template::new(source, nodes))
    }

    /// Render `template` into `out`, returning the bindings as the template
    /// left them.
    pub fn render_to(
        &self,
        out: &mut dyn Write,
        template: &Template,
        bindings: Bindings,
    ) -> Result<Bindings, RenderError> {
        let mut ctx = NodeContext::new(bindings, &self.config);
        render::render(out, template.nodes(), &mut ctx)?;
        Ok(ctx.into_bindings())
    }

    pub fn render_template(
        &self,
        template: &Template,
        bindings: Bindings,
    ) -> Result<String, RenderError> {
        let mut ctx = NodeContext::new(bindings, &self.config);
        render::render_to_string(template.nodes(), &mut ctx)
    }

    /// Parse and render `source` in one step.
    pub fn render_string(&self, source: &str, bindings: Bindings) -> Result<String, RenderError> {
        let template = self.parse(source)?;
        self.render_template(&template, bindings)
    }

    /// Read, parse and render a template file.
    ///
    /// Unlike `include`, `path` is not resolved against the include root.
    pub fn render_path(
        &self,
        path: impl AsRef<Path>,
        bindings: Bindings,
    ) -> Result<String, RenderError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "rendering template file");
        let source = fs::read_to_string(path).map_err(|error| RenderError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let template = self.parse(&source).map_err(|error| RenderError::FileParse {
            path: path.to_path_buf(),
            error,
        })?;
        self.render_template(&template, bindings)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default(), |_| {})
    }
}
