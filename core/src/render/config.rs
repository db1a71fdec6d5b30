use core::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;

use super::{RenderContext, Result, Tag, tags};
use crate::expression::ExpressionConfig;
use crate::parser::{self, Grammar, Node, ParseError};

/// Default bound on nested `render_file` calls.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Settings shared read-only by every render: the tag grammar and the
/// behavior behind each tag, the expression configuration, and file
/// inclusion limits.
///
/// A `Config` is `Send + Sync` and can be shared by reference between threads
/// rendering independent templates.
///
/// # Example
///
/// ```
/// use stencil_core::render::{Config, RenderContext};
///
/// let mut config = Config::standard();
/// config.add_tag("shout", |ctx: &mut RenderContext<'_, '_>, out| {
///     let text = ctx.evaluate_string(ctx.tag_args())?;
///     write!(out, "{}!", text.to_string().to_uppercase())?;
///     Ok(())
/// });
/// let nodes = config.parse("{% shout 'hi' %}").unwrap();
/// assert_eq!(nodes.len(), 1);
/// ```
#[derive(Clone)]
pub struct Config {
    expression: ExpressionConfig,
    grammar: Grammar,
    tags: HashMap<String, Arc<dyn Tag>>,
    include_root: Option<PathBuf>,
    max_include_depth: usize,
}

impl Config {
    /// A configuration without tags or filters.
    pub fn new() -> Self {
        Self {
            expression: ExpressionConfig::new(),
            grammar: Grammar::new(),
            tags: HashMap::new(),
            include_root: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// A configuration with the standard tags and filters.
    pub fn standard() -> Self {
        let mut config = Self::new();
        config.expression = ExpressionConfig::standard();
        tags::register_standard_tags(&mut config);
        config
    }

    /// Parse template source using this configuration's tag grammar.
    pub fn parse(&self, source: &str) -> core::result::Result<Vec<Node>, ParseError> {
        parser::parse(source, &self.grammar)
    }

    /// Register a tag without a body: `{% name args %}`.
    pub fn add_tag<F>(&mut self, name: &str, tag: F) -> &mut Self
    where
        F: Fn(&mut RenderContext<'_, '_>, &mut dyn Write) -> Result<()> + Send + Sync + 'static,
    {
        self.register_tag(name, None, Arc::new(tag))
    }

    /// Register a block tag: `{% name args %} ... {% endname %}`, which may
    /// be split by the given clause tags.
    pub fn add_block<F>(&mut self, name: &str, clauses: &[&str], tag: F) -> &mut Self
    where
        F: Fn(&mut RenderContext<'_, '_>, &mut dyn Write) -> Result<()> + Send + Sync + 'static,
    {
        self.register_tag(name, Some(clauses), Arc::new(tag))
    }

    /// Register any [`Tag`] implementation. `clauses` is `None` for a
    /// functional tag and `Some` for a block tag.
    pub fn register_tag(
        &mut self,
        name: &str,
        clauses: Option<&[&str]>,
        tag: Arc<dyn Tag>,
    ) -> &mut Self {
        match clauses {
            Some(clauses) => self.grammar.add_block(name, clauses),
            None => self.grammar.add_functional(name),
        }
        self.tags.insert(name.to_string(), tag);
        self
    }

    pub fn find_tag(&self, name: &str) -> Option<&dyn Tag> {
        self.tags.get(name).map(|tag| tag.as_ref())
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn expression(&self) -> &ExpressionConfig {
        &self.expression
    }

    /// Mutable access to the expression configuration, to add filters.
    pub fn expression_mut(&mut self) -> &mut ExpressionConfig {
        &mut self.expression
    }

    pub fn include_root(&self) -> Option<&Path> {
        self.include_root.as_deref()
    }

    /// Directory that relative `render_file` paths are resolved against.
    /// Without one they resolve against the working directory.
    pub fn set_include_root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.include_root = Some(root.into());
        self
    }

    pub fn max_include_depth(&self) -> usize {
        self.max_include_depth
    }

    pub fn set_max_include_depth(&mut self, depth: usize) -> &mut Self {
        self.max_include_depth = depth;
        self
    }

    /// Where `render_file(path)` reads from.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.include_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("Config")
            .field("tags", &tags)
            .field("expression", &self.expression)
            .field("include_root", &self.include_root)
            .field("max_include_depth", &self.max_include_depth)
            .finish()
    }
}
