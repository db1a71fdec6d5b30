#![allow(dead_code)]

use once_cell::sync::Lazy;
use stencil::{Bindings, Engine, EngineOptions, EvalError, RenderError, Value};

/// Engine shared by the template cases: the standard library plus a `money`
/// filter.
pub static ENGINE: Lazy<Engine> = Lazy::new(|| {
    Engine::new(EngineOptions::default(), |config| {
        config.expression_mut().add_filter("money", |input, _| match input.as_float() {
            Some(amount) => Ok(Value::from(format!("${:.2}", amount))),
            None => Err(EvalError::filter_argument("money", "expected a number")),
        });
    })
});

/// Bindings from a JSON object.
pub fn bindings(data: Option<&str>) -> Bindings {
    let Some(data) = data else {
        return Bindings::new();
    };
    match serde_json::from_str(data) {
        Ok(Value::Map(map)) => map.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        Ok(other) => panic!("test data must be an object, got {:?}", other),
        Err(e) => panic!("invalid test data: {}", e),
    }
}

pub fn render(template: &str, data: Option<&str>) -> Result<String, RenderError> {
    ENGINE.render_string(template, bindings(data))
}

#[macro_export]
macro_rules! test_case {
    (
        name: $name:ident,
        template: $template:expr,
        $(data: $data:expr,)?
        output: $output:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let data: Option<&str> = None $(.or(Some($data)))?;
            let output = $crate::cases::render($template, data).unwrap_or_else(|e| {
                panic!(
                    "rendering failed:\n{}",
                    stencil::render_error_to_string_no_color(&e)
                )
            });
            pretty_assertions::assert_eq!(output, $output);
        }
    };
    (
        name: $name:ident,
        template: $template:expr,
        $(data: $data:expr,)?
        error: $error:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let data: Option<&str> = None $(.or(Some($data)))?;
            match $crate::cases::render($template, data) {
                Ok(output) => panic!("rendering succeeded with {:?}", output),
                Err(e) => pretty_assertions::assert_eq!(e.to_string(), $error),
            }
        }
    };
}
