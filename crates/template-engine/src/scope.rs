use crate::options::DenyList;
use sandbox_template_util::{Action, JsValue};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which a data object carries its actions table.
pub const ACTIONS_KEY: &str = "actions";

/// Caller-supplied bindings: plain data fields plus the actions table.
///
/// Entries of a nested `actions` object are moved into the actions table and
/// are not readable as ordinary identifiers; they can only be invoked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    fields: BTreeMap<String, JsValue>,
    actions: BTreeMap<String, JsValue>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds bindings from a JSON object. Non-object values yield no bindings.
    pub fn from_json(value: Value) -> Self {
        let mut data = Data::new();
        if let Value::Object(map) = value {
            for (name, value) in map {
                match value {
                    Value::Object(actions) if name == ACTIONS_KEY => {
                        for (action, value) in actions {
                            data.actions.insert(action, JsValue::Json(value));
                        }
                    }
                    value => {
                        data.fields.insert(name, JsValue::Json(value));
                    }
                }
            }
        }
        data
    }

    /// Adds or replaces a data field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Registers an action, invoked with the implicit receiver passed to
    /// `execute_with`/`evaluate_with`.
    pub fn with_action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&JsValue) -> Result<JsValue, String> + Send + Sync + 'static,
    {
        self.actions
            .insert(name.into(), JsValue::Function(Action::new(f)));
        self
    }

    pub fn field(&self, name: &str) -> Option<&JsValue> {
        self.fields.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&JsValue> {
        self.actions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.actions.is_empty()
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Data::from_json(value)
    }
}

/// What an identifier resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<'a> {
    Value(&'a JsValue),
    Action(&'a JsValue),
    Absent,
}

/// The bindings visible to one evaluation. Built fresh per call, read-only.
pub struct Scope<'a> {
    data: &'a Data,
    receiver: &'a JsValue,
    deny: &'a DenyList,
}

impl<'a> Scope<'a> {
    pub fn new(data: &'a Data, receiver: &'a JsValue, deny: &'a DenyList) -> Self {
        Scope {
            data,
            receiver,
            deny,
        }
    }

    /// Two-stage lookup: deny-listed names are absent without consulting the
    /// data, then actions, then fields. There is no fallback beyond the data.
    pub fn resolve(&self, name: &str) -> Binding<'a> {
        if self.deny.contains(name) {
            trace!(name, "deny-listed identifier");
            return Binding::Absent;
        }
        if let Some(action) = self.data.action(name) {
            return Binding::Action(action);
        }
        match self.data.field(name) {
            Some(value) => Binding::Value(value),
            None => Binding::Absent,
        }
    }

    /// Resolves `name` against the actions table only.
    pub fn action(&self, name: &str) -> Option<&'a JsValue> {
        if self.deny.contains(name) {
            return None;
        }
        self.data.action(name)
    }

    /// Implicit receiver passed to every action call.
    pub fn receiver(&self) -> &'a JsValue {
        self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_are_not_fields() {
        let data = Data::from(json!({"a": 1, "actions": {"d": 2}}));
        assert_eq!(data.field("a"), Some(&JsValue::from(1)));
        assert_eq!(data.field("actions"), None);
        assert_eq!(data.action("d"), Some(&JsValue::from(2)));
    }

    #[test]
    fn test_non_object_actions_stay_a_field() {
        let data = Data::from(json!({"actions": [1]}));
        assert_eq!(data.field("actions"), Some(&JsValue::from(json!([1]))));
        assert_eq!(data.action("0"), None);
    }

    #[test]
    fn test_resolve_order() {
        let data = Data::from(json!({"a": 1, "onchange": 2, "d": 3}))
            .with_action("d", |_| Ok(JsValue::Undefined));
        let deny = DenyList::new();
        let receiver = JsValue::Undefined;
        let scope = Scope::new(&data, &receiver, &deny);
        assert_eq!(scope.resolve("a"), Binding::Value(&JsValue::from(1)));
        assert_eq!(scope.resolve("onchange"), Binding::Absent);
        assert_eq!(scope.resolve("missing"), Binding::Absent);
        assert!(matches!(scope.resolve("d"), Binding::Action(JsValue::Function(_))));
    }

    #[test]
    fn test_non_object_data_has_no_bindings() {
        assert!(Data::from(json!([1, 2])).is_empty());
        assert!(Data::from(json!(null)).is_empty());
    }
}
