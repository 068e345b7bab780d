use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Malformed expression text. `offset` is a byte offset into the expression.
    #[error("SyntaxError: {message} (at offset {offset})")]
    Syntax { message: String, offset: usize },

    /// No isolated evaluation scope could be guaranteed.
    #[error("SandboxViolation: {0}")]
    SandboxViolation(String),

    /// Valid syntax, invalid operation at run time.
    #[error("TypeError: {0}")]
    Runtime(String),

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
}

/// Coarse classification of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    SandboxViolation,
    Runtime,
    InvalidOptions,
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        EvalError::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Syntax { .. } => ErrorKind::Syntax,
            EvalError::SandboxViolation(_) => ErrorKind::SandboxViolation,
            EvalError::Runtime(_) => ErrorKind::Runtime,
            EvalError::InvalidOptions(_) => ErrorKind::InvalidOptions,
        }
    }
}
