use crate::value::JsValue;
use serde_json::Value;

/// Property names that never resolve, whatever the receiver holds.
pub const PROTO_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Check if a value has an own property with the given key.
///
/// This is the Rust equivalent of `Object.prototype.hasOwnProperty.call(obj, key)`
/// restricted to the JSON value model: object keys, array indices and strings
/// indices, plus `length` on arrays and strings. Prototype hooks are never own
/// properties.
///
/// # Examples
///
/// ```
/// use sandbox_template_util::{has_own_property, JsValue};
/// use serde_json::json;
///
/// let obj = JsValue::from(json!({"foo": 1}));
/// assert!(has_own_property(&obj, "foo"));
/// assert!(!has_own_property(&obj, "constructor"));
/// assert!(has_own_property(&JsValue::from(json!([1, 2])), "length"));
/// ```
pub fn has_own_property(obj: &JsValue, key: &str) -> bool {
    get_own_property(obj, key).is_some()
}

/// Returns the own property `key` of `obj`, or `None` if there is none.
pub fn get_own_property(obj: &JsValue, key: &str) -> Option<JsValue> {
    if PROTO_KEYS.contains(&key) {
        return None;
    }
    match obj {
        JsValue::Json(Value::Object(map)) => map.get(key).cloned().map(JsValue::Json),
        JsValue::Json(Value::Array(arr)) => {
            if key == "length" {
                return Some(JsValue::from(arr.len() as i64));
            }
            arr.get(parse_index(key)?).cloned().map(JsValue::Json)
        }
        JsValue::Json(Value::String(s)) => {
            // Indexed by UTF-16 code unit, like JS strings.
            let units: Vec<u16> = s.encode_utf16().collect();
            if key == "length" {
                return Some(JsValue::from(units.len() as i64));
            }
            let unit = *units.get(parse_index(key)?)?;
            Some(JsValue::from(String::from_utf16_lossy(&[unit])))
        }
        _ => None,
    }
}

/// Canonical array index: decimal digits without a leading zero (except `0`).
fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}
