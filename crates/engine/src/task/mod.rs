//! Task types supported by the compiler.
//!
//! Each task type implements [`TaskDefinition`], which supplies the pieces
//! that differ per service API: the operation name, the integration patterns
//! it supports, its field validation, its parameter rendering, and the
//! authorization statements it needs. The shared pipeline in
//! [`crate::compile`] stitches those together.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use statecraft_types::{DeploymentEnv, IntegrationPattern, PolicyStatement};

use crate::error::CompileError;

pub mod create_virtual_cluster;
pub mod delete_virtual_cluster;
pub mod start_job_run;

pub use create_virtual_cluster::CreateVirtualCluster;
pub use delete_virtual_cluster::DeleteVirtualCluster;
pub use start_job_run::{JobDriver, SparkSubmitJobDriver, StartJobRun};

/// Service prefix shared by every task in this crate.
pub const SERVICE: &str = "emr-containers";

/// Per-task-type behavior plugged into the compile pipeline.
pub trait TaskDefinition {
    /// API operation name used in the resource ARN (for example `startJobRun`).
    fn operation(&self) -> &'static str;

    /// Integration patterns this task can run under.
    fn supported_patterns(&self) -> &'static [IntegrationPattern];

    /// Pattern used when the caller does not pick one.
    fn default_pattern(&self) -> IntegrationPattern;

    /// Field-level validation of the task's own specification.
    fn validate(&self) -> Result<(), CompileError>;

    /// The `Parameters` object of the task state.
    fn render_parameters(&self, env: &DeploymentEnv) -> JsonMap<String, Value>;

    /// Statements the orchestrator role needs, primary action first.
    fn policy_statements(&self, pattern: IntegrationPattern, env: &DeploymentEnv) -> Vec<PolicyStatement>;
}

/// State-level options rendered alongside the task's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOptions {
    /// Human-readable description of the state.
    #[serde(default)]
    pub comment: Option<String>,
    /// Path selecting the part of the state input passed to the task.
    #[serde(default)]
    pub input_path: Option<String>,
    /// Path selecting the part of the state output passed on.
    #[serde(default)]
    pub output_path: Option<String>,
    /// Path where the task result is written into the state input.
    #[serde(default)]
    pub result_path: Option<String>,
    /// Maximum time the state may run.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Maximum time between heartbeats from the task.
    #[serde(default)]
    pub heartbeat_seconds: Option<u64>,
}

/// The concrete task being compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskKind {
    StartJobRun(StartJobRun),
    CreateVirtualCluster(CreateVirtualCluster),
    DeleteVirtualCluster(DeleteVirtualCluster),
}

impl TaskKind {
    pub fn definition(&self) -> &dyn TaskDefinition {
        match self {
            Self::StartJobRun(task) => task,
            Self::CreateVirtualCluster(task) => task,
            Self::DeleteVirtualCluster(task) => task,
        }
    }
}

/// A task specification plus the options shared by every task state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Requested integration pattern; the task type's default when absent.
    #[serde(default)]
    pub integration_pattern: Option<IntegrationPattern>,
    #[serde(default, rename = "state")]
    pub options: StateOptions,
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            integration_pattern: None,
            options: StateOptions::default(),
            kind,
        }
    }

    pub fn with_pattern(mut self, pattern: IntegrationPattern) -> Self {
        self.integration_pattern = Some(pattern);
        self
    }

    pub fn with_options(mut self, options: StateOptions) -> Self {
        self.options = options;
        self
    }

    /// The requested pattern, or the task type's default.
    pub fn pattern(&self) -> IntegrationPattern {
        self.integration_pattern.unwrap_or_else(|| self.kind.definition().default_pattern())
    }
}

impl From<StartJobRun> for Task {
    fn from(task: StartJobRun) -> Self {
        Task::new(TaskKind::StartJobRun(task))
    }
}

impl From<CreateVirtualCluster> for Task {
    fn from(task: CreateVirtualCluster) -> Self {
        Task::new(TaskKind::CreateVirtualCluster(task))
    }
}

impl From<DeleteVirtualCluster> for Task {
    fn from(task: DeleteVirtualCluster) -> Self {
        Task::new(TaskKind::DeleteVirtualCluster(task))
    }
}

/// ARN of a virtual cluster, widened to every cluster when the id is only known at runtime.
pub(crate) fn virtual_cluster_arn(id: Option<&str>, env: &DeploymentEnv) -> String {
    env.arn(SERVICE, &format!("/virtualclusters/{}", id.unwrap_or("*")))
}
