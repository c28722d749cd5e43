//! Error handling for the churn dashboard
//!
//! Startup failures (`Config`, `ModelLoad`) are fatal and abort initialization.
//! Request failures (`Validation`, `Prediction`, `InvalidTransition`) stay
//! inside the request that raised them.

use thiserror::Error;

/// Main error type for the dashboard
#[derive(Error, Debug)]
pub enum DashError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Model load failed: {path} - {message}")]
    ModelLoad { path: String, message: String },

    #[error("Prediction failed: {message}")]
    Prediction { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Invalid request transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with DashError
pub type DashResult<T> = Result<T, DashError>;

impl DashError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a model load error
    pub fn model_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that abort process initialization
    pub fn is_fatal(&self) -> bool {
        matches!(self, DashError::Config { .. } | DashError::ModelLoad { .. })
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        DashError::io("io_operation", err)
    }
}

/// Convert from figment errors
impl From<figment::Error> for DashError {
    fn from(err: figment::Error) -> Self {
        DashError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = DashError::config("Missing CATEGORICAL partition");
        assert!(config_err.to_string().contains("Configuration error"));
        assert!(config_err.is_fatal());

        let pred_err = DashError::prediction("unseen category");
        assert!(pred_err.to_string().contains("Prediction failed"));
        assert!(!pred_err.is_fatal());
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let dash_err = DashError::io("reading feature spec", io_err);

        assert!(dash_err.source().is_some());
        assert!(dash_err.to_string().contains("I/O operation failed"));
    }
}
