//! Placeholder scanning and substitution.

use crate::coerce::to_js_string;
use crate::error::EvalError;
use crate::evaluate::Evaluator;
use crate::options::EngineOptions;
use crate::sandbox::Sandbox;
use crate::scope::Data;
use regex::Regex;
use sandbox_template_util::JsValue;
use std::sync::OnceLock;

/// A single template or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Template::Single(s.to_string())
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Template::Single(s)
    }
}

impl From<Vec<String>> for Template {
    fn from(list: Vec<String>) -> Self {
        Template::List(list)
    }
}

impl From<Vec<&str>> for Template {
    fn from(list: Vec<&str>) -> Self {
        Template::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Template {
    fn from(list: &[&str]) -> Self {
        Template::List(list.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Template {
    fn from(list: [&str; N]) -> Self {
        Template::List(list.iter().map(|s| s.to_string()).collect())
    }
}

/// Result of [`TemplateEngine::execute`], shaped like its input.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Single(JsValue),
    List(Vec<JsValue>),
}

impl Output {
    /// The value of a single-template result.
    pub fn single(self) -> Option<JsValue> {
        match self {
            Output::Single(v) => Some(v),
            Output::List(_) => None,
        }
    }

    /// The values of a list-template result.
    pub fn list(self) -> Option<Vec<JsValue>> {
        match self {
            Output::List(v) => Some(v),
            Output::Single(_) => None,
        }
    }

    /// Converts into plain JSON; a list becomes an array.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Output::Single(v) => v.into_json(),
            Output::List(items) => {
                serde_json::Value::Array(items.into_iter().map(JsValue::into_json).collect())
            }
        }
    }
}

fn default_placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{(.+?)\}\}").unwrap())
}

/// Evaluates `{{ expression }}` placeholders in templates.
///
/// ```
/// use sandbox_template::{Data, JsValue, Output, TemplateEngine};
/// use serde_json::json;
///
/// let engine = TemplateEngine::new();
/// let data = Data::from(json!({"a": 100, "name": "tf"}));
///
/// let out = engine.execute("{{a + 1}}", &data).unwrap();
/// assert_eq!(out, Output::Single(JsValue::from(101)));
///
/// let out = engine.execute("hi {{name}}!", &data).unwrap();
/// assert_eq!(out, Output::Single(JsValue::from("hi tf!")));
/// ```
#[derive(Clone)]
pub struct TemplateEngine {
    evaluator: Evaluator,
    placeholder: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        TemplateEngine {
            evaluator: Evaluator::new(),
            placeholder: default_placeholder_regex().clone(),
        }
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &EngineOptions) -> Result<Self, EvalError> {
        let evaluator = Evaluator::with_options(options)?;
        let pattern = format!(
            "(?s){}(.+?){}",
            regex::escape(&options.open),
            regex::escape(&options.close)
        );
        let placeholder =
            Regex::new(&pattern).map_err(|e| EvalError::InvalidOptions(e.to_string()))?;
        Ok(TemplateEngine {
            evaluator,
            placeholder,
        })
    }

    /// Replaces the source of the isolated scope used by every evaluation.
    pub fn with_sandbox(mut self, sandbox: impl Sandbox + 'static) -> Self {
        self.evaluator = self.evaluator.with_sandbox(sandbox);
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn execute(
        &self,
        template: impl Into<Template>,
        data: &Data,
    ) -> Result<Output, EvalError> {
        self.execute_with(template, data, &JsValue::Undefined)
    }

    /// Like [`execute`](Self::execute), passing `extra` as the implicit
    /// argument of action calls.
    pub fn execute_with(
        &self,
        template: impl Into<Template>,
        data: &Data,
        extra: &JsValue,
    ) -> Result<Output, EvalError> {
        match template.into() {
            Template::Single(tpl) => self.render(&tpl, data, extra).map(Output::Single),
            Template::List(list) => list
                .iter()
                .map(|tpl| self.render(tpl, data, extra))
                .collect::<Result<Vec<_>, _>>()
                .map(Output::List),
        }
    }

    fn render(&self, tpl: &str, data: &Data, extra: &JsValue) -> Result<JsValue, EvalError> {
        let trimmed = tpl.trim();
        if let Some(caps) = self.placeholder.captures(trimmed) {
            let whole = caps.get(0).map(|m| m.range());
            if whole == Some(0..trimmed.len()) {
                trace!(template = tpl, "single placeholder, keeping native value");
                return self
                    .evaluator
                    .evaluate_with(&caps[1], data, extra);
            }
        } else {
            return Ok(JsValue::from(tpl));
        }

        trace!(template = tpl, "interpolating placeholders");
        let mut out = String::with_capacity(tpl.len());
        let mut last = 0;
        for caps in self.placeholder.captures_iter(tpl) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&tpl[last..whole.start()]);
            let value = self.evaluator.evaluate_with(inner.as_str(), data, extra)?;
            out.push_str(&to_js_string(&value));
            last = whole.end();
        }
        out.push_str(&tpl[last..]);
        Ok(JsValue::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_placeholder_passthrough() {
        let engine = TemplateEngine::new();
        let out = engine.execute("  plain {text} ", &Data::new()).unwrap();
        assert_eq!(out, Output::Single(JsValue::from("  plain {text} ")));
    }

    #[test]
    fn test_single_placeholder_is_trimmed() {
        let engine = TemplateEngine::new();
        let out = engine.execute("  {{ a }}\n", &Data::from(json!({"a": [1]}))).unwrap();
        assert_eq!(out, Output::Single(JsValue::from(json!([1]))));
    }

    #[test]
    fn test_adjacent_placeholders_interpolate() {
        let engine = TemplateEngine::new();
        let out = engine
            .execute("{{a}}{{b}}", &Data::from(json!({"a": 1, "b": 2})))
            .unwrap();
        assert_eq!(out, Output::Single(JsValue::from("12")));
    }

    #[test]
    fn test_custom_delimiters() {
        let options = EngineOptions {
            open: "${".to_string(),
            close: "}".to_string(),
            ..EngineOptions::default()
        };
        let engine = TemplateEngine::with_options(&options).unwrap();
        let data = Data::from(json!({"a": 2}));
        assert_eq!(
            engine.execute("${a * 3}", &data).unwrap(),
            Output::Single(JsValue::from(6))
        );
        assert_eq!(
            engine.execute("{{a}} ${a}", &data).unwrap(),
            Output::Single(JsValue::from("{{a}} 2"))
        );
    }

    #[test]
    fn test_output_accessors() {
        assert_eq!(Output::Single(JsValue::from(1)).single(), Some(JsValue::from(1)));
        assert_eq!(Output::Single(JsValue::from(1)).list(), None);
        assert_eq!(
            Output::List(vec![JsValue::from(1), JsValue::Undefined]).into_json(),
            json!([1, null])
        );
    }
}
