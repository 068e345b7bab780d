//! Sandboxed evaluation of a single expression.

use crate::ast::{BinOp, Expr, ExprKind, Property, UnaryOp};
use crate::coerce;
use crate::error::EvalError;
use crate::options::{DenyList, EngineOptions, DEFAULT_MAX_DEPTH};
use crate::parser::parse;
use crate::sandbox::{ensure_isolated, IsolatedScope, Sandbox};
use crate::scope::{Binding, Data, Scope};
use sandbox_template_util::{get_own_property, is_function, JsValue};
use serde_json::Value;
use std::sync::Arc;

/// Parses and evaluates expressions against caller-supplied [`Data`].
///
/// Each call checks the sandbox, parses, and evaluates in a fresh scope;
/// nothing is carried over between calls.
#[derive(Clone)]
pub struct Evaluator {
    sandbox: Arc<dyn Sandbox>,
    deny: DenyList,
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator {
            sandbox: Arc::new(IsolatedScope),
            deny: DenyList::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &EngineOptions) -> Result<Self, EvalError> {
        options.validate()?;
        Ok(Evaluator {
            deny: options.deny_list(),
            max_depth: options.max_depth,
            ..Self::default()
        })
    }

    /// Replaces the source of the isolated scope.
    pub fn with_sandbox(mut self, sandbox: impl Sandbox + 'static) -> Self {
        self.sandbox = Arc::new(sandbox);
        self
    }

    pub fn evaluate(&self, expr: &str, data: &Data) -> Result<JsValue, EvalError> {
        self.evaluate_with(expr, data, &JsValue::Undefined)
    }

    /// Evaluates `expr`; `receiver` is passed to every action the expression
    /// invokes.
    pub fn evaluate_with(
        &self,
        expr: &str,
        data: &Data,
        receiver: &JsValue,
    ) -> Result<JsValue, EvalError> {
        ensure_isolated(self.sandbox.as_ref())?;
        let ast = parse(expr, self.max_depth)?;
        trace!(expr, "evaluating expression");
        let scope = Scope::new(data, receiver, &self.deny);
        eval(&ast, &scope)
    }
}

/// Evaluates `expr` with the default sandbox and deny-list.
///
/// ```
/// use sandbox_template::{evaluate, Data, JsValue};
/// use serde_json::json;
///
/// let data = Data::from(json!({"a": 100}));
/// assert_eq!(evaluate("a + 1", &data).unwrap(), JsValue::from(101));
/// assert_eq!(evaluate("onchange", &data).unwrap(), JsValue::Undefined);
/// ```
pub fn evaluate(expr: &str, data: &Data) -> Result<JsValue, EvalError> {
    Evaluator::new().evaluate(expr, data)
}

fn eval(expr: &Expr, scope: &Scope<'_>) -> Result<JsValue, EvalError> {
    match &expr.kind {
        ExprKind::Literal(value) => Ok(value.clone()),
        ExprKind::Ident(name) => match scope.resolve(name) {
            Binding::Value(value) => Ok(value.clone()),
            Binding::Action(_) => call(name, scope),
            Binding::Absent => Ok(JsValue::Undefined),
        },
        ExprKind::Member(object, property) => {
            let target = eval(object, scope)?;
            let key = match property {
                Property::Named(name) => name.clone(),
                Property::Computed(index) => coerce::to_property_key(&eval(index, scope)?),
            };
            read_property(&target, &key)
        }
        ExprKind::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Neg => coerce::neg(&value),
                UnaryOp::Not => JsValue::from(!coerce::is_truthy(&value)),
            })
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let a = eval(lhs, scope)?;
            let b = eval(rhs, scope)?;
            Ok(match op {
                BinOp::Add => coerce::add(&a, &b),
                BinOp::Sub => coerce::sub(&a, &b),
                BinOp::Mul => coerce::mul(&a, &b),
                BinOp::Div => coerce::div(&a, &b),
                BinOp::StrictEq => JsValue::from(coerce::strict_equals(&a, &b)),
                BinOp::StrictNe => JsValue::from(!coerce::strict_equals(&a, &b)),
                BinOp::Lt => JsValue::from(coerce::js_lt(&a, &b)),
                BinOp::Le => JsValue::from(coerce::js_lte(&a, &b)),
                BinOp::Gt => JsValue::from(coerce::js_gt(&a, &b)),
                BinOp::Ge => JsValue::from(coerce::js_gte(&a, &b)),
            })
        }
        ExprKind::Ternary(cond, then, els) => {
            // Only the chosen branch runs.
            if coerce::is_truthy(&eval(cond, scope)?) {
                eval(then, scope)
            } else {
                eval(els, scope)
            }
        }
        ExprKind::Array(items) => items
            .iter()
            .map(|item| eval(item, scope).map(JsValue::into_json))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| JsValue::Json(Value::Array(items))),
        ExprKind::Call(name) => call(name, scope),
    }
}

fn read_property(target: &JsValue, key: &str) -> Result<JsValue, EvalError> {
    match target {
        JsValue::Undefined => Err(EvalError::Runtime(format!(
            "Cannot read properties of undefined (reading '{key}')"
        ))),
        JsValue::Json(Value::Null) => Err(EvalError::Runtime(format!(
            "Cannot read properties of null (reading '{key}')"
        ))),
        _ => Ok(get_own_property(target, key).unwrap_or(JsValue::Undefined)),
    }
}

fn call(name: &str, scope: &Scope<'_>) -> Result<JsValue, EvalError> {
    match scope.action(name) {
        Some(action) if is_function(action) => {
            trace!(name, "invoking action");
            action
                .call(scope.receiver())
                .map_err(|msg| EvalError::Runtime(format!("action `{name}` failed: {msg}")))
        }
        _ => Err(EvalError::Runtime(format!("{name} is not a function"))),
    }
}
