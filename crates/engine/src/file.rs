//! Task file loading.
//!
//! A task file is a YAML or JSON document holding one task specification,
//! tagged by `task:`, plus optional `env:` overrides for ARN formatting.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statecraft_types::{DeploymentEnv, EnvOverrides};
use tracing::debug;

use crate::task::Task;

/// A parsed task file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    /// Per-file deployment environment overrides.
    #[serde(default)]
    pub env: Option<EnvOverrides>,
    #[serde(flatten)]
    pub task: Task,
}

impl TaskFile {
    /// Overlay this file's `env:` block on `base`.
    pub fn deployment_env(&self, base: DeploymentEnv) -> DeploymentEnv {
        match &self.env {
            Some(overrides) => base.with_overrides(overrides),
            None => base,
        }
    }
}

/// Load a task file, choosing the parser from the extension.
///
/// `.json` files are parsed as JSON; everything else, including files
/// without an extension, as YAML.
///
/// # Errors
///
/// Returns an error when the file cannot be read or does not describe a
/// known task type.
pub fn load_task_file(file_path: impl AsRef<Path>) -> Result<TaskFile> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read task file: {}", file_path.display()))?;

    let is_json = file_path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

    let task_file = if is_json {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON task file: {}", file_path.display()))?
    } else {
        parse_task_str(&content).with_context(|| format!("Failed to parse task file: {}", file_path.display()))?
    };
    debug!(path = %file_path.display(), "loaded task file");
    Ok(task_file)
}

/// Parse a YAML (or JSON, which is valid YAML) task document.
pub fn parse_task_str(content: &str) -> Result<TaskFile> {
    serde_yaml::from_str(content).context("Task document must contain a 'task' field naming a known task type")
}
