//! Isolated-scope detection.
//!
//! Evaluation only proceeds when the configured [`Sandbox`] hands out an
//! isolated scope: a defined, empty object. Anything else fails closed.

use crate::error::EvalError;
use sandbox_template_util::{is_object, is_undefined, JsValue};
use serde_json::{Map, Value};

/// Source of the isolated scope an expression runs in.
pub trait Sandbox: Send + Sync {
    /// Returns the scope for one evaluation, or `JsValue::Undefined` when no
    /// isolated scope can be provided.
    fn isolated_scope(&self) -> JsValue;
}

/// Default sandbox: a fresh empty object per evaluation. Expressions have no
/// route to host state, so isolation always holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolatedScope;

impl Sandbox for IsolatedScope {
    fn isolated_scope(&self) -> JsValue {
        JsValue::Json(Value::Object(Map::new()))
    }
}

/// Asks `sandbox` for a scope and rejects it unless it is isolated.
///
/// Runs on every evaluation; the outcome is never cached.
pub fn ensure_isolated(sandbox: &dyn Sandbox) -> Result<(), EvalError> {
    let scope = sandbox.isolated_scope();
    if is_undefined(&scope) {
        debug!("sandbox check failed: no isolated scope");
        return Err(EvalError::SandboxViolation(
            "no isolated evaluation scope is available".to_string(),
        ));
    }
    let empty = matches!(&scope, JsValue::Json(Value::Object(map)) if map.is_empty());
    if !is_object(&scope) || !empty {
        debug!(?scope, "sandbox check failed: scope exposes bindings");
        return Err(EvalError::SandboxViolation(
            "evaluation scope is not isolated".to_string(),
        ));
    }
    Ok(())
}
