//! Compile-time errors.
//!
//! Every error is raised while gating or validating a task; rendering and
//! policy derivation assume a validated task and cannot fail.

use statecraft_types::{IntegrationPattern, ValueError, join_patterns};
use thiserror::Error;

/// Errors raised while compiling a task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(
        "Unsupported service integration pattern. Supported patterns: {}. Received: {received}",
        join_patterns(.supported)
    )]
    UnsupportedPattern {
        supported: Vec<IntegrationPattern>,
        received: IntegrationPattern,
    },

    #[error("{field} must be between {min} and {max} characters long, got {actual}")]
    Length {
        field: String,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("{field} must be {expected}, found {found}")]
    Type { field: String, expected: String, found: String },

    #[error(
        "An execution role must be provided when the virtual cluster id is resolved at runtime; a generated role cannot be trusted for an unknown cluster"
    )]
    MissingExecutionRole,

    #[error("{field} must have at most {max} entries, got {actual}")]
    TooManyEntries { field: String, actual: usize, max: usize },

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl CompileError {
    /// Create a length error.
    pub fn length(field: impl Into<String>, actual: usize, min: usize, max: usize) -> Self {
        Self::Length {
            field: field.into(),
            actual,
            min,
            max,
        }
    }

    /// Create a type error.
    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Type {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a too-many-entries error.
    pub fn too_many_entries(field: impl Into<String>, actual: usize, max: usize) -> Self {
        Self::TooManyEntries {
            field: field.into(),
            actual,
            max,
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Length { field, .. }
            | Self::Type { field, .. }
            | Self::TooManyEntries { field, .. }
            | Self::InvalidValue { field, .. } => Some(field.as_str()),
            Self::MissingExecutionRole => Some("executionRole"),
            Self::UnsupportedPattern { .. } => Some("integrationPattern"),
            Self::Value(_) => None,
        }
    }
}
