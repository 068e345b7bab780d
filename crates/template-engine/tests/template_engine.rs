//! Integration tests for `TemplateEngine::execute`.

use sandbox_template::{Data, ErrorKind, EvalError, JsValue, Output, Sandbox, TemplateEngine};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn check(template: &str, data: Value, expected: Value) {
    let engine = TemplateEngine::new();
    let out = engine
        .execute(template, &Data::from(data))
        .unwrap_or_else(|e| panic!("execute({template}) failed: {e}"));
    assert_eq!(out.into_json(), expected, "template: {template}");
}

fn check_err(template: &str, data: Value) -> EvalError {
    TemplateEngine::new()
        .execute(template, &Data::from(data))
        .err()
        .unwrap_or_else(|| panic!("expected error for {template}"))
}

// ----------------------------------------------------------------- Native results

#[test]
fn test_single_identifier() {
    check("{{a}}", json!({"a": 100}), json!(100));
}

#[test]
fn test_arithmetic() {
    check("{{1 + 1}}", json!({}), json!(2));
    check("{{1+1}}", json!({}), json!(2));
    check("{{a + 1}}", json!({"a": 100}), json!(101));
    check("{{a + b}}", json!({"a": 100, "b": 200}), json!(300));
    check("{{(a + b) * 2 - 1}}", json!({"a": 1, "b": 2}), json!(5));
    check("{{a / 4}}", json!({"a": 1}), json!(0.25));
}

#[test]
fn test_ternary() {
    let engine = TemplateEngine::new();
    let tpl = "{{a > 100 ? 1 : 2}}";
    let out = engine.execute(tpl, &Data::from(json!({"a": 100}))).unwrap();
    assert_eq!(out, Output::Single(JsValue::from(2)));
    let out = engine.execute(tpl, &Data::from(json!({"a": 101}))).unwrap();
    assert_eq!(out, Output::Single(JsValue::from(1)));
}

#[test]
fn test_ternary_does_not_evaluate_unchosen_branch() {
    // `missing.x` fails if evaluated.
    check("{{a ? 1 : missing.x}}", json!({"a": true}), json!(1));
    check("{{a ? missing.x : 2}}", json!({"a": false}), json!(2));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let data = Data::from(json!({"a": 0})).with_action("effect", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(JsValue::from(9))
    });
    let out = TemplateEngine::new()
        .execute("{{a ? effect : 3}}", &data)
        .unwrap();
    assert_eq!(out, Output::Single(JsValue::from(3)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_strict_comparison() {
    check(r#"{{a === "a"}}"#, json!({"a": "a"}), json!(true));
    check(r#"{{a.b === "a"}}"#, json!({"a": {"b": "a"}}), json!(true));
    check(r#"{{a.b !== "a"}}"#, json!({"a": {"b": "a"}}), json!(false));
    check("{{a === '1'}}", json!({"a": 1}), json!(false));
}

#[test]
fn test_array_literal_keeps_native_type() {
    check("{{[a]}}", json!({"a": 1}), json!([1]));
    check("{{[a, 'x', [b]]}}", json!({"a": 1, "b": true}), json!([1, "x", [true]]));
}

#[test]
fn test_object_result() {
    check("{{a}}", json!({"a": {"b": [1, 2]}}), json!({"b": [1, 2]}));
}

// ----------------------------------------------------------------- Actions

#[test]
fn test_call_action_with_extra_scope() {
    let data = Data::from(json!({"a": {"b": {"c": 12}}}))
        .with_action("d", |current| Ok(current.get("b").get("c")));
    let out = TemplateEngine::new()
        .execute_with("{{d}}", &data, &JsValue::from(json!({"b": {"c": 12}})))
        .unwrap();
    assert_eq!(out, Output::Single(JsValue::from(12)));
}

#[test]
fn test_action_without_extra_receives_undefined() {
    let data = Data::new().with_action("probe", |current| {
        Ok(JsValue::from(matches!(current, JsValue::Undefined)))
    });
    let out = TemplateEngine::new().execute("{{probe}}", &data).unwrap();
    assert_eq!(out, Output::Single(JsValue::from(true)));
}

#[test]
fn test_actions_are_not_data() {
    let data = Data::from(json!({"actions": {"d": 1}}));
    let out = TemplateEngine::new().execute("{{actions}}", &data).unwrap();
    assert_eq!(out, Output::Single(JsValue::Undefined));
}

// ----------------------------------------------------------------- Shapes

#[test]
fn test_list_template() {
    let out = TemplateEngine::new()
        .execute_with(
            ["{{a}}"],
            &Data::from(json!({"a": 1})),
            &JsValue::from(json!({"b": {"c": 12}})),
        )
        .unwrap();
    assert_eq!(out, Output::List(vec![JsValue::from(1)]));
}

#[test]
fn test_list_template_elements_are_independent() {
    let engine = TemplateEngine::new();
    let data = Data::from(json!({"a": 1, "b": "x"}));
    let out = engine
        .execute(vec!["{{a}}", "b={{b}}", "plain", "{{[a]}}"], &data)
        .unwrap();
    assert_eq!(out.into_json(), json!([1, "b=x", "plain", [1]]));

    let out = engine.execute(Vec::<String>::new(), &data).unwrap();
    assert_eq!(out, Output::List(vec![]));
}

#[test]
fn test_interpolation() {
    check("a={{a}}, b={{b}}", json!({"a": 1, "b": "x"}), json!("a=1, b=x"));
    check("sum: {{a + 1}}", json!({"a": 1}), json!("sum: 2"));
    check("{{missing}}!", json!({}), json!("undefined!"));
    check("[{{list}}]", json!({"list": [1, 2, 3]}), json!("[1,2,3]"));
    check("{{o}}?", json!({"o": {}}), json!("[object Object]?"));
    check("{{n}}", json!({"n": null}), json!(null));
    check("n={{n}}", json!({"n": null}), json!("n=null"));
}

#[test]
fn test_no_placeholders() {
    check("hello world", json!({}), json!("hello world"));
    check("", json!({}), json!(""));
    check("{ a }", json!({"a": 1}), json!("{ a }"));
}

#[test]
fn test_multiline_expression() {
    check("{{a >\n 1 ? 'big'\n : 'small'}}", json!({"a": 2}), json!("big"));
}

// ----------------------------------------------------------------- Errors

#[test]
fn test_errors_propagate() {
    assert_eq!(check_err("{{asd///}}", json!({})).kind(), ErrorKind::Syntax);
    assert_eq!(check_err("x {{a.b}} y", json!({})).kind(), ErrorKind::Runtime);
    assert_eq!(check_err("{{1}} {{(}}", json!({})).kind(), ErrorKind::Syntax);
}

#[test]
fn test_long_chains_are_rejected_not_overflowed() {
    let engine = TemplateEngine::new();
    for n in [10_000, 30_000] {
        let tpl = format!("{{{{{}}}}}", vec!["1"; n].join("+"));
        let err = engine.execute(tpl, &Data::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.to_string().contains("nested deeper"), "{err}");
    }

    let data = Data::from(json!({"a": {"b": 1}}));
    let tpl = format!("{{{{a{}}}}}", ".b".repeat(10_000));
    assert_eq!(engine.execute(tpl, &data).unwrap_err().kind(), ErrorKind::Syntax);

    let tpl = format!("{{{{{}}}}}", vec!["1"; 50].join("+"));
    assert_eq!(engine.execute(tpl, &Data::new()).unwrap().into_json(), json!(50));
}

#[test]
fn test_large_numbers_interpolate_like_js() {
    check("n={{a * 1000}}", json!({"a": 1e18}), json!("n=1e+21"));
    check("n={{a}}", json!({"a": 0.0000001}), json!("n=1e-7"));
}

#[test]
fn test_list_error_fails_whole_call() {
    let err = TemplateEngine::new()
        .execute(["{{a}}", "{{a.b.c}}"], &Data::from(json!({"a": 1, "b": 2})))
        .unwrap_err();
    // `a.b` is undefined, so reading `.c` fails.
    assert_eq!(err.kind(), ErrorKind::Runtime);
}

struct NoIsolation;

impl Sandbox for NoIsolation {
    fn isolated_scope(&self) -> JsValue {
        JsValue::Undefined
    }
}

#[test]
fn test_sandbox_violation_propagates() {
    let engine = TemplateEngine::new().with_sandbox(NoIsolation);
    let err = engine.execute("{{1}}", &Data::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SandboxViolation);

    // Nothing to evaluate, nothing to check.
    let out = engine.execute("plain", &Data::new()).unwrap();
    assert_eq!(out, Output::Single(JsValue::from("plain")));
}
