//! Configuration options for the Stencil engine.

use std::path::PathBuf;

use crate::render::DEFAULT_MAX_INCLUDE_DEPTH;

/// Configuration options for the Stencil engine.
///
/// These seed the engine's [`Config`](crate::render::Config) before the
/// initialization closure passed to [`Engine::new`](super::Engine::new) runs,
/// so the closure can still override them.
///
/// # Example
///
/// ```
/// use stencil_core::api::EngineOptions;
///
/// let options = EngineOptions {
///     include_root: Some("templates".into()),
///     max_include_depth: 8,
///     ..EngineOptions::default()
/// };
/// assert!(options.standard_library);
/// ```
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Register the standard tags and filters.
    ///
    /// Default: true
    pub standard_library: bool,

    /// Directory that relative include paths resolve against.
    ///
    /// Default: None (the working directory)
    pub include_root: Option<PathBuf>,

    /// Maximum nesting of included files.
    ///
    /// Default: 64
    pub max_include_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            standard_library: true,
            include_root: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}
