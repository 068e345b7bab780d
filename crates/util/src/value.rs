use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied callable, invoked with the implicit receiver of a call.
///
/// The error string is surfaced to the caller as a runtime error.
pub type ActionFn = dyn Fn(&JsValue) -> Result<JsValue, String> + Send + Sync;

/// Shared handle to an [`ActionFn`].
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&JsValue) -> Result<JsValue, String> + Send + Sync + 'static,
    {
        Action(Arc::new(f))
    }

    pub fn call(&self, receiver: &JsValue) -> Result<JsValue, String> {
        (self.0)(receiver)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Represents any value an expression can produce, including `undefined`
/// (no JSON equivalent) and callables.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    /// JavaScript `undefined`.
    Undefined,
    /// Any JSON-compatible value.
    Json(Value),
    /// A callable exposed through the actions table.
    Function(Action),
}

impl JsValue {
    pub fn null() -> Self {
        JsValue::Json(Value::Null)
    }

    /// Reads an own property, returning `Undefined` when it is missing or the
    /// receiver has no properties.
    ///
    /// Lenient counterpart of member access, meant for action bodies:
    ///
    /// ```
    /// use sandbox_template_util::JsValue;
    /// use serde_json::json;
    ///
    /// let current = JsValue::from(json!({"b": {"c": 12}}));
    /// assert_eq!(current.get("b").get("c"), JsValue::from(12));
    /// assert_eq!(current.get("x").get("y"), JsValue::Undefined);
    /// ```
    pub fn get(&self, key: &str) -> JsValue {
        crate::has_own_property::get_own_property(self, key).unwrap_or(JsValue::Undefined)
    }

    /// Invokes a `Function` value with `receiver`. Other values are not
    /// callable.
    pub fn call(&self, receiver: &JsValue) -> Result<JsValue, String> {
        match self {
            JsValue::Function(action) => action.call(receiver),
            _ => Err("value is not callable".to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            JsValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Converts into plain JSON. `undefined` and functions have no JSON form
    /// and become `null`, as they would inside `JSON.stringify` arrays.
    pub fn into_json(self) -> Value {
        match self {
            JsValue::Json(v) => v,
            JsValue::Undefined | JsValue::Function(_) => Value::Null,
        }
    }

    /// Converts an IEEE double into a value, keeping integral results as
    /// JSON integers. NaN and infinities have no JSON form and become `null`.
    pub fn from_f64(n: f64) -> Self {
        if !n.is_finite() {
            return JsValue::null();
        }
        if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
            // -0.0 collapses to 0, matching `String(-0)`.
            return JsValue::Json(Value::Number(serde_json::Number::from(n as i64)));
        }
        match serde_json::Number::from_f64(n) {
            Some(num) => JsValue::Json(Value::Number(num)),
            None => JsValue::null(),
        }
    }
}

impl From<Value> for JsValue {
    fn from(v: Value) -> Self {
        JsValue::Json(v)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Json(Value::Bool(b))
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::from_f64(n)
    }
}

impl From<i64> for JsValue {
    fn from(n: i64) -> Self {
        JsValue::Json(Value::Number(serde_json::Number::from(n)))
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::from(i64::from(n))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::Json(Value::String(s))
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::Json(Value::String(s.to_string()))
    }
}

impl From<Action> for JsValue {
    fn from(a: Action) -> Self {
        JsValue::Function(a)
    }
}
