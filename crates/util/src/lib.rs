//! sandbox-template-util - value model and predicates for sandbox-template
//!
//! This crate holds the pieces the expression evaluator consults to make its
//! safety decisions: the [`JsValue`] model and tag-based classification helpers.

pub mod checker;
pub mod has_own_property;
pub mod value;

// Re-exports for convenience
pub use checker::{is_empty_array, is_function, is_object, is_string, is_total_word, is_undefined};
pub use has_own_property::{get_own_property, has_own_property, PROTO_KEYS};
pub use value::{Action, ActionFn, JsValue};
