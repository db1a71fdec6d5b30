use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Diagnostic, IntoDiagnostic, Result};
use stencil::{Bindings, Engine, EngineOptions, Value, render_error};
use thiserror::Error;
use tracing::debug;

/// Stencil - A small, embeddable template engine
#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "Render a Stencil template to stdout", long_about = None)]
struct Args {
    /// Template file to render
    template: PathBuf,

    /// JSON object whose keys become template variables
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Bind a variable; the value is parsed as JSON, or taken as a string
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Directory that `include` paths resolve against
    #[arg(long, value_name = "DIR")]
    include_root: Option<PathBuf>,

    /// Log parsing and rendering to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("cannot read data file `{}`", .path.display())]
    #[diagnostic(code(stencil::data))]
    ReadData {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("invalid JSON in `{}`", .path.display())]
    #[diagnostic(code(stencil::data))]
    InvalidData {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    #[error("data file `{}` must hold a JSON object, found {found}", .path.display())]
    #[diagnostic(code(stencil::data))]
    NotAnObject { path: PathBuf, found: &'static str },

    #[error("invalid --set `{0}`")]
    #[diagnostic(code(stencil::set), help("use --set name=value"))]
    InvalidSet(String),
}

fn load_data(path: &Path) -> Result<Bindings, CliError> {
    let text = fs::read_to_string(path).map_err(|error| CliError::ReadData {
        path: path.to_path_buf(),
        error,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|error| CliError::InvalidData {
        path: path.to_path_buf(),
        error,
    })?;
    match value {
        Value::Map(map) => Ok(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect()),
        other => Err(CliError::NotAnObject {
            path: path.to_path_buf(),
            found: other.type_name(),
        }),
    }
}

fn parse_assignment(arg: &str) -> Result<(String, Value), CliError> {
    let Some((name, raw)) = arg.split_once('=') else {
        return Err(CliError::InvalidSet(arg.to_string()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidSet(arg.to_string()));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG wins; otherwise warnings only, or debug with --verbose.
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut bindings = match &args.data {
        Some(path) => load_data(path)?,
        None => Bindings::new(),
    };
    for arg in &args.set {
        let (name, value) = parse_assignment(arg)?;
        debug!(%name, "binding from command line");
        bindings.set(name, value);
    }

    let options = EngineOptions {
        include_root: args.include_root.clone(),
        ..EngineOptions::default()
    };
    let engine = Engine::new(options, |_| {});

    match engine.render_path(&args.template, bindings) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes()).into_diagnostic()?;
            stdout.flush().into_diagnostic()?;
            Ok(())
        }
        Err(e) => {
            render_error(&e);
            std::process::exit(1);
        }
    }
}
