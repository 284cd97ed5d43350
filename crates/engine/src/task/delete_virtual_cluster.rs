//! Delete a virtual cluster.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use statecraft_types::{DeploymentEnv, IntegrationPattern, PolicyStatement, Resolvable};

use super::{TaskDefinition, virtual_cluster_arn};
use crate::error::CompileError;
use crate::render::insert_resolvable;

const SUPPORTED_PATTERNS: &[IntegrationPattern] = &[IntegrationPattern::RequestResponse, IntegrationPattern::RunJob];

/// Deletes the virtual cluster identified by `virtual_cluster_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteVirtualCluster {
    pub virtual_cluster_id: Resolvable<String>,
}

impl DeleteVirtualCluster {
    pub fn new(virtual_cluster_id: impl Into<Resolvable<String>>) -> Self {
        Self {
            virtual_cluster_id: virtual_cluster_id.into(),
        }
    }
}

impl TaskDefinition for DeleteVirtualCluster {
    fn operation(&self) -> &'static str {
        "deleteVirtualCluster"
    }

    fn supported_patterns(&self) -> &'static [IntegrationPattern] {
        SUPPORTED_PATTERNS
    }

    fn default_pattern(&self) -> IntegrationPattern {
        IntegrationPattern::RunJob
    }

    fn validate(&self) -> Result<(), CompileError> {
        if let Some(id) = self.virtual_cluster_id.as_literal()
            && id.trim().is_empty()
        {
            return Err(CompileError::invalid_value("virtualClusterId", "cannot be empty"));
        }
        Ok(())
    }

    fn render_parameters(&self, _env: &DeploymentEnv) -> JsonMap<String, Value> {
        let mut parameters = JsonMap::new();
        insert_resolvable(&mut parameters, "Id", &self.virtual_cluster_id);
        parameters
    }

    fn policy_statements(&self, pattern: IntegrationPattern, env: &DeploymentEnv) -> Vec<PolicyStatement> {
        let cluster_arn = virtual_cluster_arn(self.virtual_cluster_id.as_literal().map(String::as_str), env);
        let mut statements = vec![PolicyStatement::allow(["emr-containers:DeleteVirtualCluster"], [cluster_arn.clone()])];
        if pattern == IntegrationPattern::RunJob {
            statements.push(PolicyStatement::allow(["emr-containers:DescribeVirtualCluster"], [cluster_arn]));
        }
        statements
    }
}
