//! The compile pipeline: gate, validate, render, derive.

use serde::Serialize;
use serde_json::Value;
use statecraft_types::{DeploymentEnv, PolicyStatement};
use tracing::{debug, info, warn};

use crate::error::CompileError;
use crate::gate::validate_pattern;
use crate::policy::derive_statements;
use crate::render::render_state;
use crate::task::{Task, TaskKind};
use crate::validate::validate_task;

/// Outputs of a successful compilation. Neither output refers back to the task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTask {
    /// Task state document consumed by the workflow definition.
    pub state: Value,
    /// Statements to attach to the orchestrator's runtime role.
    pub policy_statements: Vec<PolicyStatement>,
}

/// Trust-policy work for a generated job execution role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustPolicyRequest {
    /// Literal id of the virtual cluster the role must be trusted by.
    pub virtual_cluster_id: String,
    /// ARN of the generated execution role.
    pub role_arn: String,
}

/// External mechanism that updates a role's trust policy for a virtual cluster.
///
/// The compiler hands over the request and moves on; failures are logged
/// and never fail the compilation.
pub trait TrustPolicyUpdater: Send + Sync {
    fn request_update(&self, request: &TrustPolicyRequest) -> anyhow::Result<()>;
}

/// Compiles tasks against a fixed deployment environment.
pub struct Compiler {
    env: DeploymentEnv,
    trust_updater: Option<Box<dyn TrustPolicyUpdater>>,
}

impl Compiler {
    pub fn new(env: DeploymentEnv) -> Self {
        Self { env, trust_updater: None }
    }

    /// Register the collaborator notified when a task needs a generated role trusted.
    pub fn with_trust_updater(mut self, updater: impl TrustPolicyUpdater + 'static) -> Self {
        self.trust_updater = Some(Box::new(updater));
        self
    }

    /// Gate the integration pattern, then validate every field.
    pub fn validate(&self, task: &Task) -> Result<(), CompileError> {
        let definition = task.kind.definition();
        validate_pattern(task.pattern(), definition.supported_patterns())?;
        validate_task(task)
    }

    /// Compile `task` into its state document and policy statements.
    pub fn compile(&self, task: &Task) -> Result<CompiledTask, CompileError> {
        let pattern = task.pattern();
        let operation = task.kind.definition().operation();
        debug!(operation, pattern = %pattern, "compiling task");

        self.validate(task)?;
        let state = render_state(task, pattern, &self.env);
        let policy_statements = derive_statements(task, pattern, &self.env);
        self.notify_trust_updater(task);

        info!(operation, pattern = %pattern, statements = policy_statements.len(), "task compiled");
        Ok(CompiledTask { state, policy_statements })
    }

    fn notify_trust_updater(&self, task: &Task) {
        let (Some(updater), TaskKind::StartJobRun(start)) = (&self.trust_updater, &task.kind) else {
            return;
        };
        let Some(request) = start.trust_policy_request(&self.env) else {
            return;
        };
        if let Err(error) = updater.request_update(&request) {
            warn!(
                virtual_cluster_id = %request.virtual_cluster_id,
                error = %error,
                "trust policy update request failed"
            );
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(DeploymentEnv::default())
    }
}
