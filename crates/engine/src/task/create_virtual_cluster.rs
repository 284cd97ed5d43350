//! Create a virtual cluster on top of an EKS namespace.
//!
//! Creating the first virtual cluster in an account also creates the
//! service-linked role, so the orchestrator role needs permission to create
//! exactly that role for exactly that service principal.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value, json};
use statecraft_types::{DeploymentEnv, IntegrationPattern, JsonPath, PolicyStatement, Resolvable};

use super::TaskDefinition;
use crate::error::CompileError;
use crate::render::{insert_resolvable, render_tag_map};
use crate::validate::{NAME_LENGTH, check_resolvable_length, validate_tags};

const SUPPORTED_PATTERNS: &[IntegrationPattern] = &[IntegrationPattern::RequestResponse];

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "default";
/// Service principal allowed to assume the service-linked role.
pub const SERVICE_PRINCIPAL: &str = "emr-containers.amazonaws.com";
/// Path and name of the service-linked role created on first use.
pub const SERVICE_LINKED_ROLE: &str = "role/aws-service-role/emr-containers.amazonaws.com/AWSServiceRoleForAmazonEMRContainers";

/// Creates a virtual cluster bound to an EKS cluster namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVirtualCluster {
    /// EKS cluster name or runtime reference.
    pub eks_cluster: Resolvable<String>,
    /// Kubernetes namespace the virtual cluster is registered with.
    #[serde(default)]
    pub eks_namespace: Option<Resolvable<String>>,
    /// Virtual cluster name; defaults to the execution name.
    #[serde(default)]
    pub virtual_cluster_name: Option<Resolvable<String>>,
    #[serde(default)]
    pub tags: Option<IndexMap<String, String>>,
}

impl CreateVirtualCluster {
    pub fn new(eks_cluster: impl Into<Resolvable<String>>) -> Self {
        Self {
            eks_cluster: eks_cluster.into(),
            eks_namespace: None,
            virtual_cluster_name: None,
            tags: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<Resolvable<String>>) -> Self {
        self.eks_namespace = Some(namespace.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<Resolvable<String>>) -> Self {
        self.virtual_cluster_name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(IndexMap::new).insert(key.into(), value.into());
        self
    }

    fn namespace(&self) -> Resolvable<String> {
        self.eks_namespace
            .clone()
            .unwrap_or_else(|| Resolvable::literal(DEFAULT_NAMESPACE.to_string()))
    }
}

impl TaskDefinition for CreateVirtualCluster {
    fn operation(&self) -> &'static str {
        "createVirtualCluster"
    }

    fn supported_patterns(&self) -> &'static [IntegrationPattern] {
        SUPPORTED_PATTERNS
    }

    fn default_pattern(&self) -> IntegrationPattern {
        IntegrationPattern::RequestResponse
    }

    fn validate(&self) -> Result<(), CompileError> {
        if let Some(cluster) = self.eks_cluster.as_literal()
            && cluster.trim().is_empty()
        {
            return Err(CompileError::invalid_value("eksCluster", "cannot be empty"));
        }
        if let Some(namespace) = self.eks_namespace.as_ref().and_then(Resolvable::as_literal)
            && namespace.trim().is_empty()
        {
            return Err(CompileError::invalid_value("eksNamespace", "cannot be empty"));
        }
        if let Some(name) = &self.virtual_cluster_name {
            check_resolvable_length("virtualClusterName", name, NAME_LENGTH)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    fn render_parameters(&self, _env: &DeploymentEnv) -> JsonMap<String, Value> {
        let mut parameters = JsonMap::new();
        let name = self
            .virtual_cluster_name
            .clone()
            .unwrap_or_else(|| Resolvable::RuntimeRef(JsonPath::execution_name()));
        insert_resolvable(&mut parameters, "Name", &name);

        let mut provider = JsonMap::new();
        insert_resolvable(&mut provider, "Id", &self.eks_cluster);
        provider.insert("Type".to_string(), json!("EKS"));
        let mut eks_info = JsonMap::new();
        insert_resolvable(&mut eks_info, "Namespace", &self.namespace());
        provider.insert("Info".to_string(), json!({ "EksInfo": eks_info }));
        parameters.insert("ContainerProvider".to_string(), Value::Object(provider));

        if let Some(tags) = &self.tags {
            parameters.insert("Tags".to_string(), render_tag_map(tags));
        }
        parameters
    }

    fn policy_statements(&self, _pattern: IntegrationPattern, env: &DeploymentEnv) -> Vec<PolicyStatement> {
        vec![
            PolicyStatement::allow(["emr-containers:CreateVirtualCluster"], ["*"]),
            PolicyStatement::allow(["iam:CreateServiceLinkedRole"], [env.global_arn("iam", SERVICE_LINKED_ROLE)]).with_condition(
                "StringLike",
                "iam:AWSServiceName",
                SERVICE_PRINCIPAL,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> DeploymentEnv {
        DeploymentEnv::new("aws", "us-east-1", "123456789012")
    }

    #[test]
    fn renders_defaults_for_name_and_namespace() {
        let task = CreateVirtualCluster::new("my-eks");
        assert_eq!(
            Value::Object(task.render_parameters(&env())),
            json!({
                "Name.$": "$$.Execution.Name",
                "ContainerProvider": {
                    "Id": "my-eks",
                    "Type": "EKS",
                    "Info": {"EksInfo": {"Namespace": "default"}}
                }
            })
        );
    }

    #[test]
    fn renders_inline_tags_and_runtime_cluster() {
        let task = CreateVirtualCluster::new("$.eks.name")
            .with_namespace("spark")
            .with_name("analytics")
            .with_tag("team", "data")
            .with_tag("env", "prod");
        let parameters = Value::Object(task.render_parameters(&env()));

        assert_eq!(parameters["Name"], "analytics");
        assert_eq!(parameters["ContainerProvider"]["Id.$"], "$.eks.name");
        assert_eq!(parameters["ContainerProvider"]["Info"]["EksInfo"]["Namespace"], "spark");
        assert_eq!(parameters["Tags"], json!({"team": "data", "env": "prod"}));
    }

    #[test]
    fn service_linked_role_scoped_to_exact_principal() {
        let statements = CreateVirtualCluster::new("my-eks").policy_statements(IntegrationPattern::RequestResponse, &env());
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].actions, vec!["emr-containers:CreateVirtualCluster"]);

        let role_statement = &statements[1];
        assert_eq!(
            role_statement.resources,
            vec![
                "arn:aws:iam::123456789012:role/aws-service-role/emr-containers.amazonaws.com/AWSServiceRoleForAmazonEMRContainers"
            ]
        );
        let conditions = role_statement.conditions.as_ref().unwrap();
        assert_eq!(conditions["StringLike"]["iam:AWSServiceName"], SERVICE_PRINCIPAL);
    }

    #[test]
    fn runtime_namespace_renders_as_reference() {
        let task = CreateVirtualCluster::new("eks").with_namespace("$.Namespace");
        assert!(task.validate().is_ok());

        let parameters = task.render_parameters(&DeploymentEnv::default());
        let eks_info = &parameters["ContainerProvider"]["Info"]["EksInfo"];
        assert_eq!(eks_info, &json!({"Namespace.$": "$.Namespace"}));
    }

    #[test]
    fn validates_name_and_namespace() {
        assert!(CreateVirtualCluster::new("eks").with_name("a".repeat(65)).validate().is_err());
        assert!(CreateVirtualCluster::new("eks").with_namespace("").validate().is_err());
        assert!(CreateVirtualCluster::new("eks").with_name("$.name").validate().is_ok());
    }
}
