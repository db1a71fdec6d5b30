//! Unit tests for `NodeContext` and the `RenderContext` tag interface.

use std::fs;
use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::bindings::Bindings;
use crate::expression::EvalError;
use crate::parser::{Chunk, Functional, Node, Span};
use crate::test_utils::init_test_logging;
use crate::value::Value;

/// Standard configuration plus probe tags that expose `RenderContext`
/// operations through the output.
fn config() -> Config {
    let mut config = Config::standard();
    config
        .add_tag("probe", |ctx, out| {
            match ctx.get(ctx.tag_args()) {
                Some(value) => write!(out, "{}", value)?,
                None => write!(out, "<unbound>")?,
            }
            Ok(())
        })
        .add_tag("args", |ctx, out| {
            let args = ctx.parse_tag_args()?;
            write!(out, "[{}]", args)?;
            Ok(())
        })
        .add_tag("name", |ctx, out| {
            write!(out, "{}", ctx.tag_name())?;
            ctx.render_children(out)
        })
        .add_tag("file", |ctx, out| {
            let rendered = ctx.render_file(ctx.tag_args())?;
            write!(out, "{}", rendered)?;
            Ok(())
        })
        .add_block("isolated", &[], |ctx, out| {
            let mut inner = ctx.clone_scope();
            inner.set("local", "inner");
            write!(out, "{}:", inner.tag_name())?;
            inner.render_children(out)?;
            write!(out, "|")?;
            ctx.render_children(out)
        })
        .add_block("twice", &[], |ctx, out| {
            let text = ctx.inner_string()?;
            write!(out, "{}{}", text, text)?;
            Ok(())
        })
        .add_block("pick", &["other"], |ctx, out| {
            match ctx.block().and_then(|block| block.clause("other")) {
                Some(other) => ctx.render_child(out, other),
                None => Ok(()),
            }
        })
        .add_tag("let", |ctx, _| {
            let (name, source) = ctx
                .tag_args()
                .split_once('=')
                .ok_or_else(|| RenderError::argument("let", "expected `name = expression`"))?;
            let value = ctx.evaluate_string(source.trim())?;
            ctx.update_bindings([(name.trim(), value)]);
            Ok(())
        });
    config
        .expression_mut()
        .add_filter("boom", |_, _| panic!("filter exploded"));
    config
}

fn bindings() -> Bindings {
    [("name", "x"), ("title", "Report")].into_iter().collect()
}

/// Render `source`, returning the output written so far and the result.
fn render_partial(config: &Config, source: &str, ctx: &mut NodeContext<'_>) -> (String, Result<()>) {
    let nodes = config.parse(source).unwrap();
    let mut out = Vec::new();
    let result = render(&mut out, &nodes, ctx);
    (String::from_utf8(out).unwrap(), result)
}

fn render_str(config: &Config, source: &str, ctx: &mut NodeContext<'_>) -> String {
    let (out, result) = render_partial(config, source, ctx);
    result.unwrap_or_else(|e| panic!("rendering {:?} failed: {}", source, e));
    out
}

fn render_err(config: &Config, source: &str) -> RenderError {
    let mut ctx = NodeContext::new(bindings(), config);
    match render_partial(config, source, &mut ctx) {
        (out, Ok(())) => panic!("rendering {:?} succeeded with {:?}", source, out),
        (_, Err(err)) => err,
    }
}

fn functional(name: &str, args: &str) -> Node {
    Node::Functional(Functional {
        chunk: Chunk {
            name: name.to_string(),
            args: args.to_string(),
            span: Span::default(),
        },
    })
}

#[test]
fn test_sequence_with_assign_renders_and_binds() {
    init_test_logging();
    let config = config();
    let nodes = vec![
        Node::Text("A".to_string()),
        functional("assign", "x = 1"),
        Node::Text("B".to_string()),
    ];
    let mut ctx = NodeContext::new(Bindings::new(), &config);
    let mut out = Vec::new();
    render(&mut out, &nodes, &mut ctx).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "AB");
    assert_eq!(ctx.get("x"), Some(&Value::Int(1)));
}

#[test]
fn test_get_unbound_is_absent() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(ctx.get("nobody"), None);
    assert_eq!(render_str(&config, "{% probe nobody %}", &mut ctx), "<unbound>");
    assert_eq!(render_str(&config, "[{{ nobody }}]", &mut ctx), "[]");
}

#[test]
fn test_later_siblings_observe_earlier_writes() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    let out = render_str(
        &config,
        "{% probe y %} {% let y = title | upcase %}{% probe y %}",
        &mut ctx,
    );
    assert_eq!(out, "<unbound> REPORT");
    assert_eq!(ctx.get("y"), Some(&Value::from("REPORT")));
}

#[test]
fn test_clone_scope_isolates_writes() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    let out = render_str(
        &config,
        "{% isolated %}{{ local }}/{{ title }}{% endisolated %}",
        &mut ctx,
    );
    // The clone keeps the tag identity, sees the outer `title`, and its
    // `local` is invisible once rendering returns to the original scope.
    assert_eq!(out, "isolated:inner/Report|/Report");
    assert_eq!(ctx.get("local"), None);
}

#[test]
fn test_node_context_clone_reads_through() {
    let config = config();
    let mut outer = NodeContext::new(bindings(), &config);
    let mut inner = outer.clone_scope();
    inner.set("title", "Shadowed");
    outer.set("late", 1);
    assert_eq!(inner.get("title"), Some(&Value::from("Shadowed")));
    assert_eq!(inner.get("name"), Some(&Value::from("x")));
    assert_eq!(inner.get("late"), None);
    assert_eq!(outer.get("title"), Some(&Value::from("Report")));
}

#[test]
fn test_evaluate_string() {
    let config = config();
    let ctx = NodeContext::new(bindings(), &config);
    assert_eq!(
        ctx.evaluate_string("title | append: '!'").unwrap(),
        Value::from("Report!")
    );
    assert_eq!(ctx.evaluate_string("missing").unwrap(), Value::Nil);
}

#[test]
fn test_undefined_filter_is_an_evaluation_error() {
    let config = config();
    let ctx = NodeContext::new(bindings(), &config);
    match ctx.evaluate_string("name | nope") {
        Err(RenderError::Evaluation { expression, error }) => {
            assert_eq!(expression, "name | nope");
            assert_eq!(error, EvalError::UndefinedFilter("nope".to_string()));
        }
        other => panic!("expected an evaluation error, got {:?}", other),
    }
}

#[test]
fn test_filter_panic_becomes_unexpected_fault() {
    init_test_logging();
    let config = config();
    let err = render_err(&config, "{{ title | boom }}");
    match err {
        RenderError::UnexpectedFault {
            expression,
            message,
        } => {
            assert_eq!(expression, "title | boom");
            assert_eq!(message, "filter exploded");
        }
        other => panic!("expected an unexpected fault, got {:?}", other),
    }
}

#[test]
fn test_evaluate_string_parse_error() {
    let config = config();
    let ctx = NodeContext::new(bindings(), &config);
    let err = ctx.evaluate_string("title ==").unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)), "got {:?}", err);
    assert_eq!(err.parse_error().map(|e| e.src.as_str()), Some("title =="));
}

#[test]
fn test_evaluate_statement_assigns_through_statement_grammar() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(
        render_str(&config, "{% assign t = title | downcase %}{{ t }}", &mut ctx),
        "report"
    );
}

#[test]
fn test_parse_tag_args() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(render_str(&config, "{% args plain text %}", &mut ctx), "[plain text]");
    assert_eq!(render_str(&config, "{% args {{ name }} %}", &mut ctx), "[x]");
    assert_eq!(
        render_str(&config, "{% args '{{ name }}-{{ title | size }}.tpl' %}", &mut ctx),
        "['x-6.tpl']"
    );
}

#[test]
fn test_render_children_is_noop_for_functional_tags() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(render_str(&config, "{% name %}", &mut ctx), "name");
}

#[test]
fn test_inner_string_and_render_child() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(
        render_str(&config, "{% twice %}{{ name }}.{% endtwice %}", &mut ctx),
        "x.x."
    );
    assert_eq!(
        render_str(&config, "{% pick %}main{% other %}{{ title }}{% endpick %}", &mut ctx),
        "Report"
    );
}

#[test]
fn test_undefined_tag_at_render_time() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    let mut out = Vec::new();
    let err = render(&mut out, &[functional("nope", "")], &mut ctx).unwrap_err();
    assert!(matches!(err, RenderError::UndefinedTag(ref name) if name == "nope"));
}

#[test]
fn test_failure_keeps_written_bytes_and_stops() {
    let config = config();
    let mut ctx = NodeContext::new(bindings(), &config);
    let (out, result) = render_partial(&config, "before {{ name | nope }} after", &mut ctx);
    assert_eq!(out, "before ");
    assert!(matches!(result, Err(RenderError::Evaluation { .. })));
}

#[test]
fn test_innermost_tag_is_reported() {
    let config = config();
    let err = render_err(
        &config,
        "{% if true %}{% for i in (1..name) %}{% endfor %}{% endif %}",
    );
    match &err {
        RenderError::Tag { name, args, error } => {
            assert_eq!(name, "for");
            assert_eq!(args, "i in (1..name)");
            assert!(matches!(**error, RenderError::Evaluation { .. }));
        }
        other => panic!("expected a tag error, got {:?}", other),
    }
    assert!(matches!(err.innermost(), RenderError::Evaluation { .. }));
}

#[test]
fn test_rendering_is_deterministic() {
    let config = config();
    let data: Value = serde_json::from_str(
        r#"{"people": [{"name": "b", "age": 2}, {"name": "a", "age": 1}], "meta": {"z": 1, "a": 2}}"#,
    )
    .unwrap();
    let Value::Map(map) = data else {
        panic!("fixture is a map");
    };
    let mut ctx = NodeContext::new(map.into_iter().map(|(k, v)| (k.to_string(), v)).collect(), &config);
    let nodes = config
        .parse("{% for p in people %}{{ p }};{% endfor %}{% for kv in meta %}{{ kv[0] }}={{ kv[1] }},{% endfor %}{{ meta }}")
        .unwrap();
    let first = render_to_string(&nodes, &mut ctx).unwrap();
    let second = render_to_string(&nodes, &mut ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        r#"{"age": 2, "name": b};{"age": 1, "name": a};a=2,z=1,{"a": 2, "z": 1}"#
    );
}

fn template_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[test]
fn test_render_file_missing_is_io_error() {
    let dir = template_dir(&[]);
    let mut config = config();
    config.set_include_root(dir.path());
    let err = render_err(&config, "{% file missing.tpl %}");
    match err.innermost() {
        RenderError::Io { path, error } => {
            assert_eq!(path, &dir.path().join("missing.tpl"));
            assert_eq!(error.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected an io error, got {:?}", other),
    }
}

#[test]
fn test_render_file_uses_and_updates_current_bindings() {
    let dir = template_dir(&[("greet.tpl", "Hello {{ name }}{% assign seen = true %}")]);
    let mut config = config();
    config.set_include_root(dir.path());
    let mut ctx = NodeContext::new(bindings(), &config);
    assert_eq!(
        render_str(&config, "{% file greet.tpl %}!{{ seen }}", &mut ctx),
        "Hello x!true"
    );
}

#[test]
fn test_render_file_parse_error() {
    let dir = template_dir(&[("bad.tpl", "ok {{ unclosed")]);
    let mut config = config();
    config.set_include_root(dir.path());
    let err = render_err(&config, "{% file bad.tpl %}");
    match err.innermost() {
        RenderError::FileParse { path, error } => {
            assert!(path.ends_with("bad.tpl"));
            assert_eq!(error.src, "ok {{ unclosed");
        }
        other => panic!("expected a file parse error, got {:?}", other),
    }
    assert!(err.parse_error().is_some());
}

#[test]
fn test_render_file_render_error_names_file() {
    let dir = template_dir(&[("inner.tpl", "{{ name | nope }}")]);
    let mut config = config();
    config.set_include_root(dir.path());
    let err = render_err(&config, "{% file inner.tpl %}");
    let RenderError::Tag { error, .. } = &err else {
        panic!("expected a tag error, got {:?}", err);
    };
    assert!(matches!(**error, RenderError::FileRender { .. }));
    assert!(err.file().is_some_and(|path| path.ends_with("inner.tpl")));
    assert!(matches!(err.innermost(), RenderError::Evaluation { .. }));
}

#[test]
fn test_recursive_include_is_bounded() {
    let dir = template_dir(&[("loop.tpl", "x{% include 'loop.tpl' %}")]);
    let mut config = config();
    config.set_include_root(dir.path()).set_max_include_depth(3);
    let mut ctx = NodeContext::new(bindings(), &config);
    let (out, result) = render_partial(&config, "{% include 'loop.tpl' %}", &mut ctx);
    let err = result.unwrap_err();
    assert_eq!(out, "");
    match err.innermost() {
        RenderError::IncludeDepth { max_depth, .. } => assert_eq!(*max_depth, 3),
        other => panic!("expected an include depth error, got {:?}", other),
    }
    // The depth counter is restored after the failed render.
    assert_eq!(ctx.include_depth, 0);
}
