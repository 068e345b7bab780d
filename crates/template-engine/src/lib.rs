//! Sandboxed `{{ expression }}` template engine.
//!
//! # Overview
//!
//! Templates are strings containing `{{ expression }}` placeholders. Each
//! expression is parsed by a dedicated tokenizer and recursive-descent parser
//! and evaluated by a tree-walking interpreter that only sees the [`Data`] it is
//! handed: there is no global scope to fall back to, deny-listed names read as
//! `undefined`, and evaluation refuses to start unless the configured
//! [`Sandbox`] provides an isolated scope.
//!
//! The language covers numbers, strings, `true`/`false`/`null`/`undefined`,
//! `+ - * /`, `=== !== < <= > >=`, unary `-` and `!`, the ternary operator,
//! member access (`a.b`, `a[0]`), array literals, and calls to caller-supplied
//! actions. There are no statements, loops or assignments.
//!
//! # Example
//!
//! ```
//! use sandbox_template::{Data, JsValue, Output, TemplateEngine};
//! use serde_json::json;
//!
//! let engine = TemplateEngine::new();
//! let data = Data::from(json!({"a": {"b": {"c": 12}}}))
//!     .with_action("d", |current| Ok(current.get("b").get("c")));
//!
//! let out = engine
//!     .execute_with("{{d}}", &data, &JsValue::from(json!({"b": {"c": 12}})))
//!     .unwrap();
//! assert_eq!(out, Output::Single(JsValue::from(12)));
//!
//! let out = engine.execute(["{{[a.b.c]}}", "c={{a.b.c}}"], &data).unwrap();
//! assert_eq!(out.into_json(), json!([[12], "c=12"]));
//! ```

#[macro_use]
mod tracing_macros;

pub mod ast;
pub mod coerce;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod sandbox;
pub mod scope;

// Re-export the core public API
pub use engine::{Output, Template, TemplateEngine};
pub use error::{ErrorKind, EvalError};
pub use evaluate::{evaluate, Evaluator};
pub use options::{
    DenyList, EngineOptions, DEFAULT_DENY_LIST, DEFAULT_MAX_DEPTH, MAX_DEPTH_CEILING,
};
pub use sandbox::{IsolatedScope, Sandbox};
pub use scope::Data;
pub use sandbox_template_util::{checker, Action, JsValue};
