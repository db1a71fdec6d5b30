//! Error rendering using ariadne
//!
//! Parse errors are shown as a source report pointing at the offending text,
//! followed by the tag and file context the error was raised in. Other render
//! errors print their message.

use crate::{ParseError, RenderError};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use stencil::{Bindings, Engine, render_error};
///
/// let engine = Engine::default();
/// if let Err(e) = engine.render_string("{{ name", Bindings::new()) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &RenderError) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(error: &RenderError, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for tests, web UIs, etc.)
pub fn render_error_to_string(error: &RenderError) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
///
/// This is the same as `render_error_to_string` but without ANSI color codes,
/// making the output easier to compare in tests.
pub fn render_error_to_string_no_color(error: &RenderError) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &RenderError,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error.parse_error() {
        Some(parse_error) => {
            let name = error
                .file()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<template>".to_string());
            render_parse_error(&name, parse_error, &context(error), writer, use_color)
        }
        None => writeln!(writer, "Error: {}", error),
    }
}

/// Tag and file breadcrumbs, outermost first.
fn context(error: &RenderError) -> Vec<String> {
    let mut notes = Vec::new();
    let mut current = error;
    loop {
        match current {
            RenderError::Tag { name, args, error } => {
                notes.push(format!("while rendering `{{% {} {} %}}`", name, args));
                current = error;
            }
            RenderError::FileRender { path, error } => {
                notes.push(format!("while rendering `{}`", path.display()));
                current = error;
            }
            _ => return notes,
        }
    }
}

fn render_parse_error(
    name: &str,
    error: &ParseError,
    notes: &[String],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let message = error.message();
    let mut report = Report::build(ReportKind::Error, (name, error.span.0.clone()))
        .with_message(format!("parse error: {}", message))
        .with_config(ariadne::Config::default().with_color(use_color));

    report = report.with_label(
        Label::new((name, error.span.0.clone()))
            .with_message(&message)
            .with_color(colors.next()),
    );

    for note in notes {
        report = report.with_note(note);
    }

    // Render to the writer (need to reborrow to avoid moving)
    report
        .finish()
        .write((name, Source::from(error.src.as_str())), &mut *writer)
}
