//! JS-style coercions used by the evaluator and by template interpolation.

use sandbox_template_util::{is_empty_array, is_string, JsValue};
use serde_json::Value;

// ----------------------------------------------------------------- Conversions

/// `ToNumber`. NaN is preserved; it only collapses to `null` once a result
/// is stored as a value.
pub fn to_number(value: &JsValue) -> f64 {
    match value {
        JsValue::Undefined | JsValue::Function(_) => f64::NAN,
        JsValue::Json(v) => match v {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => string_to_number(s),
            // Goes through the joined string: `+[]` is 0, `+[7]` is 7.
            Value::Array(_) => string_to_number(&to_js_string(value)),
            Value::Object(_) => f64::NAN,
        },
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts these spellings, JS does not.
        _ if s.eq_ignore_ascii_case("inf")
            || s.eq_ignore_ascii_case("infinity")
            || s.eq_ignore_ascii_case("nan") =>
        {
            f64::NAN
        }
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

/// `String(value)`.
pub fn to_js_string(value: &JsValue) -> String {
    match value {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Function(_) => "function".to_string(),
        JsValue::Json(v) => match v {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(n),
            Value::String(s) => s.clone(),
            Value::Array(_) if is_empty_array(value) => String::new(),
            Value::Array(arr) => arr
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => to_js_string(&JsValue::Json(other.clone())),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        },
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => f64_to_js_string(f),
        None => n.to_string(),
    }
}

/// `Number::toString` for a finite double: shortest round-trip digits,
/// positional between 1e-6 and 1e21, exponent form (`1e+21`) outside.
fn f64_to_js_string(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if f < 0.0 {
        return format!("-{}", f64_to_js_string(-f));
    }
    // `{:e}` yields the shortest digits, e.g. "1.2345e2".
    let sci = format!("{f:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    // Decimal point position relative to the start of `digits`.
    let n = exp.parse::<i32>().unwrap_or(0) + 1;

    if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if n - 1 >= 0 { '+' } else { '-' };
        let frac = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        format!("{first}{frac}e{sign}{}", (n - 1).abs())
    }
}

/// JS truthiness.
pub fn is_truthy(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined => false,
        JsValue::Function(_) => true,
        JsValue::Json(v) => match v {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

/// Property key for computed member access: `a[1]` reads key `"1"`.
pub fn to_property_key(value: &JsValue) -> String {
    to_js_string(value)
}

// -------------------------------------------------------------- Comparison helpers

/// `===`. Arrays and objects compare structurally since JSON data has no
/// reference identity.
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Function(fa), JsValue::Function(fb)) => fa == fb,
        (JsValue::Json(va), JsValue::Json(vb)) => json_strict_equals(va, vb),
        _ => false,
    }
}

fn json_strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // 1 === 1.0 holds; NaN never reaches here since it is stored as null.
        (Value::Number(na), Value::Number(nb)) => na.as_f64() == nb.as_f64(),
        (Value::Array(xa), Value::Array(xb)) => {
            xa.len() == xb.len() && xa.iter().zip(xb).all(|(x, y)| json_strict_equals(x, y))
        }
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|(k, v)| mb.get(k).is_some_and(|w| json_strict_equals(v, w)))
        }
        _ => a == b,
    }
}

/// Abstract relational comparison: both strings compare by UTF-16 code units,
/// anything else numerically. `None` means unordered (a NaN was involved).
fn compare(a: &JsValue, b: &JsValue) -> Option<std::cmp::Ordering> {
    if is_string(a) && is_string(b) {
        let (sa, sb) = (to_js_string(a), to_js_string(b));
        return Some(sa.encode_utf16().cmp(sb.encode_utf16()));
    }
    to_number(a).partial_cmp(&to_number(b))
}

pub fn js_lt(a: &JsValue, b: &JsValue) -> bool {
    compare(a, b).is_some_and(|o| o.is_lt())
}

pub fn js_lte(a: &JsValue, b: &JsValue) -> bool {
    compare(a, b).is_some_and(|o| o.is_le())
}

pub fn js_gt(a: &JsValue, b: &JsValue) -> bool {
    compare(a, b).is_some_and(|o| o.is_gt())
}

pub fn js_gte(a: &JsValue, b: &JsValue) -> bool {
    compare(a, b).is_some_and(|o| o.is_ge())
}

// -------------------------------------------------------------- Arithmetic helpers

/// `+`: concatenation when either side is a string, numeric addition otherwise.
pub fn add(a: &JsValue, b: &JsValue) -> JsValue {
    if is_string(a) || is_string(b) {
        let mut s = to_js_string(a);
        s.push_str(&to_js_string(b));
        return JsValue::from(s);
    }
    JsValue::from_f64(to_number(a) + to_number(b))
}

pub fn sub(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from_f64(to_number(a) - to_number(b))
}

pub fn mul(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from_f64(to_number(a) * to_number(b))
}

/// Division by zero yields ±Infinity or NaN, both stored as `null`.
pub fn div(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from_f64(to_number(a) / to_number(b))
}

pub fn neg(a: &JsValue) -> JsValue {
    JsValue::from_f64(-to_number(a))
}
