//! Shared type definitions for the statecraft task compiler.
//!
//! These types are consumed by the engine (validation, rendering, policy
//! derivation) and by the CLI when loading task files.

use thiserror::Error;

pub mod config;
pub mod env;
pub mod labels;
pub mod pattern;
pub mod policy;
pub mod value;

pub use config::{ApplicationConfiguration, Monitoring};
pub use env::{DeploymentEnv, EnvOverrides};
pub use labels::{Classification, ReleaseLabel};
pub use pattern::{IntegrationPattern, join_patterns};
pub use policy::{Conditions, Effect, PolicyStatement};
pub use value::{JsonPath, RUNTIME_KEY_SUFFIX, Resolvable, is_json_path};

/// Errors raised when constructing a typed value from raw input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("'{path}' is not a runtime path (expected '$.', '$[', '$$.' or 'States.')")]
    InvalidJsonPath { path: String },

    #[error("{kind} cannot be empty")]
    EmptyLabel { kind: &'static str },

    #[error("unknown integration pattern '{value}'")]
    UnknownPattern { value: String },
}
