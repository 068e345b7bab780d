//! Classification predicates over [`JsValue`].
//!
//! The evaluator relies on these for its safety decisions, so each one is a
//! tag check on the enum rather than a coercion.

use crate::value::JsValue;
use serde_json::Value;

/// True only for an actual `undefined`. `null`, `0`, `""` and `false` are
/// values, not absence.
pub fn is_undefined(value: &JsValue) -> bool {
    matches!(value, JsValue::Undefined)
}

pub fn is_string(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::String(_)))
}

/// True for plain objects only; arrays and `null` are not objects here.
pub fn is_object(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::Object(_)))
}

pub fn is_function(value: &JsValue) -> bool {
    matches!(value, JsValue::Function(_))
}

pub fn is_empty_array(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::Array(arr)) if arr.is_empty())
}

/// True when `s` is a non-empty run of ASCII letters.
pub fn is_total_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}
