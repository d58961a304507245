use scaffold_core::expressions::{
    evaluate, evaluate_bool, interpolate, interpolate_value, parse_expression, ExpressionError,
};
use serde_json::json;

fn scope() -> serde_json::Value {
    json!({
        "name": "widget",
        "count": 3,
        "flag": true,
        "empty": "",
        "tags": ["a", "b"],
        "config": { "port": 8080, "host": "localhost" },
        "steps": {
            "build": { "status": "completed", "error": null, "toolType": "shell" },
            "lint": { "status": "failed", "error": "boom", "toolType": "shell" }
        }
    })
}

#[test]
fn boolean_logic_and_comparisons() {
    let s = scope();
    assert!(evaluate_bool("flag && count > 2", &s).unwrap());
    assert!(!evaluate_bool("flag && count > 3", &s).unwrap());
    assert!(evaluate_bool("count >= 3 || missing", &s).unwrap());
    assert!(evaluate_bool("!empty", &s).unwrap());
    assert!(evaluate_bool("name == 'widget' and not (count != 3)", &s).unwrap());
    assert!(evaluate_bool("config.port == 8080", &s).unwrap());
    assert!(evaluate_bool("tags.1 == \"b\"", &s).unwrap());
    assert!(evaluate_bool("config[\"host\"] == 'localhost'", &s).unwrap());
}

#[test]
fn unknown_names_are_null_and_falsy() {
    let s = scope();
    assert!(!evaluate_bool("optionalThing", &s).unwrap());
    assert!(evaluate_bool("optionalThing == null", &s).unwrap());
    assert!(!evaluate_bool("config.nope.deeper", &s).unwrap());
}

#[test]
fn step_outcomes_are_visible() {
    let s = scope();
    assert!(evaluate_bool("steps.build.status == 'completed'", &s).unwrap());
    assert!(evaluate_bool("steps.lint.error", &s).unwrap());
}

#[test]
fn arithmetic_and_concatenation() {
    let s = scope();
    let e = parse_expression("count * 2 + 1").unwrap();
    assert_eq!(evaluate(&e, &s).unwrap(), json!(7));
    let e = parse_expression("name + '-' + count").unwrap();
    assert_eq!(evaluate(&e, &s).unwrap(), json!("widget-3"));
    let e = parse_expression("7 % 4 - -1").unwrap();
    assert_eq!(evaluate(&e, &s).unwrap(), json!(4));
    let e = parse_expression("count / 0").unwrap();
    assert_eq!(evaluate(&e, &s).unwrap_err(), ExpressionError::DivisionByZero);
}

#[test]
fn interpolation_replaces_embedded_expressions() {
    let s = scope();
    assert_eq!(
        interpolate("src/{{ name }}/mod_{{ count + 1 }}.rs", &s).unwrap(),
        "src/widget/mod_4.rs"
    );
    assert_eq!(interpolate("no braces here", &s).unwrap(), "no braces here");
    assert!(interpolate("{{ name", &s).is_err());
}

#[test]
fn single_expression_values_keep_their_type() {
    let s = scope();
    let out = interpolate_value(
        &json!({ "n": "{{ count }}", "t": "{{ tags }}", "label": "n={{ count }}" }),
        &s,
    )
    .unwrap();
    assert_eq!(out, json!({ "n": 3, "t": ["a", "b"], "label": "n=3" }));
}
