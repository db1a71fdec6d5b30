//! Standard tags.
//!
//! | tag       | form                                                        |
//! |-----------|-------------------------------------------------------------|
//! | `assign`  | `{% assign name = expression %}`                            |
//! | `capture` | `{% capture name %}...{% endcapture %}`                     |
//! | `comment` | `{% comment %}...{% endcomment %}`                          |
//! | `if`      | `{% if cond %}...{% elsif cond %}...{% else %}...{% endif %}` |
//! | `unless`  | `{% unless cond %}...{% else %}...{% endunless %}`          |
//! | `for`     | `{% for x in expr reversed %}...{% else %}...{% endfor %}`  |
//! | `include` | `{% include "file" %}`, `{% include "{{ name }}.tpl" %}`    |
//!
//! Tags are built only on [`RenderContext`], the same interface host tags
//! use.

use std::io::Write;

use crate::render::{Config, RenderContext, RenderError, Result};
use crate::value::Value;

pub(crate) fn register_standard_tags(config: &mut Config) {
    config
        .add_tag("assign", assign)
        .add_block("capture", &[], capture)
        .add_block("comment", &[], |_, _| Ok(()))
        .add_block("if", &["elsif", "else"], |ctx, out| conditional(ctx, out, true))
        .add_block("unless", &["else"], |ctx, out| conditional(ctx, out, false))
        .add_block("for", &["else"], for_loop)
        .add_tag("include", include);
}

fn assign(ctx: &mut RenderContext<'_, '_>, _: &mut dyn Write) -> Result<()> {
    let value = ctx.evaluate_statement("assign", ctx.tag_args())?;
    match value {
        Value::Map(map) => {
            ctx.update_bindings(map.into_iter().map(|(name, value)| (name.to_string(), value)));
            Ok(())
        }
        other => Err(RenderError::argument(
            "assign",
            format!("statement produced {}", other.type_name()),
        )),
    }
}

fn capture(ctx: &mut RenderContext<'_, '_>, _: &mut dyn Write) -> Result<()> {
    let name = ctx.tag_args();
    if !is_identifier(name) {
        return Err(RenderError::argument(
            "capture",
            format!("expected a variable name, found `{}`", name),
        ));
    }
    let text = ctx.inner_string()?;
    ctx.update_bindings([(name, text)]);
    Ok(())
}

/// `if` renders its body when the condition is truthy, `unless` when it is not.
fn conditional(ctx: &mut RenderContext<'_, '_>, out: &mut dyn Write, expect: bool) -> Result<()> {
    if ctx.evaluate_string(ctx.tag_args())?.is_truthy() == expect {
        return ctx.render_children(out);
    }
    let Some(block) = ctx.block() else {
        return Ok(());
    };
    for clause in &block.clauses {
        if clause.chunk.name == "elsif" && !ctx.evaluate_string(&clause.chunk.args)?.is_truthy() {
            continue;
        }
        return ctx.render_child(out, clause);
    }
    Ok(())
}

fn for_loop(ctx: &mut RenderContext<'_, '_>, out: &mut dyn Write) -> Result<()> {
    let args = ctx.tag_args();
    let Some((variable, rest)) = args.split_once(" in ") else {
        return Err(RenderError::argument(
            "for",
            format!("expected `name in collection`, found `{}`", args),
        ));
    };
    let variable = variable.trim();
    if !is_identifier(variable) {
        return Err(RenderError::argument(
            "for",
            format!("expected a variable name, found `{}`", variable),
        ));
    }
    let rest = rest.trim();
    let (source, reversed) = match rest.strip_suffix("reversed") {
        Some(head) if head.ends_with(char::is_whitespace) => (head.trim_end(), true),
        _ => (rest, false),
    };

    let mut items = iteration_items(ctx.evaluate_string(source)?);
    if reversed {
        items.reverse();
    }
    if items.is_empty() {
        return match ctx.block().and_then(|block| block.clause("else")) {
            Some(otherwise) => ctx.render_child(out, otherwise),
            None => Ok(()),
        };
    }

    // The loop variable and anything assigned in the body stay inside the loop.
    let mut scope = ctx.clone_scope();
    let length = items.len();
    for (i, item) in items.into_iter().enumerate() {
        let forloop: Value = [
            ("index", Value::from(i + 1)),
            ("index0", Value::from(i)),
            ("rindex", Value::from(length - i)),
            ("first", Value::from(i == 0)),
            ("last", Value::from(i + 1 == length)),
            ("length", Value::from(length)),
        ]
        .into_iter()
        .collect();
        scope.set(variable, item);
        scope.set("forloop", forloop);
        scope.render_children(out)?;
    }
    Ok(())
}

/// Arrays iterate their elements, maps their `[key, value]` pairs, and `nil`
/// nothing. Any other value is a one-element collection.
fn iteration_items(collection: Value) -> Vec<Value> {
    match collection {
        Value::Array(items) => items.iter().cloned().collect(),
        Value::Map(map) => map
            .into_iter()
            .map(|(key, value)| Value::from(vec![Value::Str(key), value]))
            .collect(),
        Value::Nil => Vec::new(),
        other => vec![other],
    }
}

fn include(ctx: &mut RenderContext<'_, '_>, out: &mut dyn Write) -> Result<()> {
    let args = ctx.parse_tag_args()?;
    let path = unquote(args.trim());
    if path.is_empty() {
        return Err(RenderError::argument("include", "expected a file name"));
    }
    let rendered = ctx.render_file(path)?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
