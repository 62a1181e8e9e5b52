//! Error types for the meta-object runtime

use crate::value::Value;
use thiserror::Error;

/// Main error type for the runtime
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("TypeError: {message}")]
    TypeError { message: String },

    /// An existing member was invoked but holds no callable value
    #[error("TypeError: {name} is not callable")]
    NotCallable { name: String },

    /// A write failed and the composition escalates failed writes
    #[error("TypeError: cannot assign to property '{key}'")]
    WriteRejected { key: String },

    /// `fix` was requested on a store that is not frozen
    #[error("TypeError: object cannot be fixed: {reason}")]
    CannotFix { reason: String },

    /// A value raised by a user-supplied hook or function
    #[error("Uncaught {value:?}")]
    Thrown { value: Value },

    #[error("ConfigError: {0}")]
    Config(#[from] serde_json::Error),
}

impl MetaError {
    pub fn type_error(message: impl Into<String>) -> Self {
        MetaError::TypeError {
            message: message.into(),
        }
    }

    pub fn not_callable(name: impl Into<String>) -> Self {
        MetaError::NotCallable { name: name.into() }
    }

    pub fn write_rejected(key: impl Into<String>) -> Self {
        MetaError::WriteRejected { key: key.into() }
    }

    pub fn cannot_fix(reason: impl Into<String>) -> Self {
        MetaError::CannotFix {
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary value raised from user code
    pub fn thrown(value: impl Into<Value>) -> Self {
        MetaError::Thrown {
            value: value.into(),
        }
    }
}
