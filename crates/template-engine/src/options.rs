//! Engine configuration and the identifier deny-list.

use crate::error::EvalError;
use crate::lexer::{is_ident_continue, is_ident_start};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Identifiers that always resolve to `undefined`, whatever the context holds.
pub const DEFAULT_DENY_LIST: &[&str] = &[
    // ambient handles
    "window", "self", "globalThis", "global", "document", "top", "parent", "frames", "opener",
    "location", "navigator", "history", "localStorage", "sessionStorage", "indexedDB", "cookie",
    "process", "require", "module", "exports", "this",
    // code execution and network
    "eval", "Function", "setTimeout", "setInterval", "setImmediate", "fetch", "XMLHttpRequest",
    "WebSocket", "Worker", "importScripts", "alert", "confirm", "prompt",
    // prototype hooks
    "constructor", "prototype", "__proto__",
    // DOM event handlers
    "onabort", "onbeforeunload", "onblur", "onchange", "onclick", "oncontextmenu", "oncopy",
    "oncut", "ondblclick", "ondrag", "ondrop", "onerror", "onfocus", "onhashchange", "oninput",
    "onkeydown", "onkeypress", "onkeyup", "onload", "onmessage", "onmousedown", "onmousemove",
    "onmouseout", "onmouseover", "onmouseup", "onpaste", "onpopstate", "onreset", "onresize",
    "onscroll", "onselect", "onstorage", "onsubmit", "ontouchend", "ontouchmove",
    "ontouchstart", "onunload", "onwheel",
];

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest accepted `max_depth`; parsing and evaluation recurse once per level.
pub const MAX_DEPTH_CEILING: usize = 256;

/// Built-in deny-list plus caller additions. It can grow, never shrink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyList {
    extra: BTreeSet<String>,
}

impl DenyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DenyList {
            extra: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        DEFAULT_DENY_LIST.contains(&name) || self.extra.contains(name)
    }
}

/// Engine configuration. Every field has a default, so a partial JSON
/// document such as `{"max_depth": 16}` deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Opening placeholder delimiter.
    pub open: String,
    /// Closing placeholder delimiter.
    pub close: String,
    /// Names added to [`DEFAULT_DENY_LIST`].
    pub deny: Vec<String>,
    /// Maximum nesting of sub-expressions accepted by the parser.
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            open: "{{".to_string(),
            close: "}}".to_string(),
            deny: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineOptions {
    /// Parses options from a JSON document.
    pub fn from_json(src: &str) -> Result<Self, EvalError> {
        let options: EngineOptions =
            serde_json::from_str(src).map_err(|e| EvalError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if self.open.is_empty() || self.close.is_empty() {
            return Err(EvalError::InvalidOptions(
                "placeholder delimiters must not be empty".to_string(),
            ));
        }
        if self.open == self.close {
            return Err(EvalError::InvalidOptions(
                "opening and closing delimiters must differ".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(EvalError::InvalidOptions(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > MAX_DEPTH_CEILING {
            return Err(EvalError::InvalidOptions(format!(
                "max_depth must not exceed {MAX_DEPTH_CEILING}"
            )));
        }
        if let Some(bad) = self.deny.iter().find(|name| !is_identifier(name)) {
            return Err(EvalError::InvalidOptions(format!(
                "deny-list entry `{bad}` is not an identifier"
            )));
        }
        Ok(())
    }

    pub fn deny_list(&self) -> DenyList {
        DenyList::with_names(self.deny.iter().cloned())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if is_ident_start(c)) && chars.all(is_ident_continue)
}
