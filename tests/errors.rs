/*
 * Error Reporting Tests
 *
 * Messages for parse, evaluation and tag errors, and the ariadne report
 * for parse errors.
 */

mod cases;

use stencil::{
    Bindings, Engine, EngineOptions, RenderError, Value, render_error_to_string_no_color,
};

test_case! {
    name: undefined_filter,
    template: "{{ name | shout }}",
    error: "undefined filter `shout` in `name | shout`",
}

test_case! {
    name: undefined_filter_inside_tag,
    template: "{% if name | shout %}{% endif %}",
    error: "in `{% if name | shout %}`: undefined filter `shout` in `name | shout`",
}

test_case! {
    name: innermost_tag_is_reported,
    template: "{% for x in (1..2) %}{% if x > 'a' %}{% endif %}{% endfor %}",
    error: "in `{% if x > 'a' %}`: cannot compare int > string in `x > 'a'`",
}

test_case! {
    name: division_by_zero,
    template: "{{ 10 | divided_by: zero }}",
    data: r#"{"zero": 0}"#,
    error: "division by zero in `10 | divided_by: zero`",
}

test_case! {
    name: host_filter_error,
    template: "{{ 'abc' | money }}",
    error: "filter `money`: expected a number in `'abc' | money`",
}

test_case! {
    name: unclosed_object,
    template: "Hi {{ name",
    error: "parse error: unclosed delimiter, expected `}}` at `{{ name`",
}

test_case! {
    name: unmatched_end_tag,
    template: "{% if a %}{% endfor %}",
    error: "parse error: `endfor` does not close `if` at `{% endfor %}`",
}

test_case! {
    name: undefined_tag,
    template: "{% bogus %}",
    error: "parse error: undefined tag `bogus` at `{% bogus %}`",
}

test_case! {
    name: malformed_for,
    template: "{% for x %}{% endfor %}",
    error: "in `{% for x %}`: invalid arguments to `for`: expected `name in collection`, found `x`",
}

#[test]
fn partial_output_is_kept() {
    let engine = Engine::default();
    let template = engine.parse("start {{ 1 | nope }} end").unwrap();
    let mut out = Vec::new();
    let err = engine
        .render_to(&mut out, &template, Bindings::new())
        .unwrap_err();
    assert_eq!(out, b"start ");
    assert!(matches!(err, RenderError::Evaluation { .. }));
}

#[test]
fn panicking_filter_is_reported_as_fault() {
    let engine = Engine::new(EngineOptions::default(), |config| {
        config
            .expression_mut()
            .add_filter("explode", |_, _| -> Result<Value, stencil::EvalError> {
                panic!("kaboom")
            });
    });
    let err = engine
        .render_string("a{{ 1 | explode }}b", Bindings::new())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unexpected fault during evaluation of `1 | explode`: kaboom"
    );
}

#[test]
fn parse_error_report_points_at_source() {
    let engine = Engine::default();
    let err = engine
        .render_string("line one\n{% if x %}\nline three", Bindings::new())
        .unwrap_err();
    let report = render_error_to_string_no_color(&err);
    assert!(report.contains("parse error: `if` block is never closed"), "{}", report);
    assert!(report.contains("<template>"), "{}", report);
    assert!(report.contains("{% if x %}"), "{}", report);
}
