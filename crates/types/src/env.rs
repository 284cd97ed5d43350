//! Deployment environment used to format ARNs.
//!
//! Values come from, in increasing precedence: built-in defaults, the
//! `STATECRAFT_*` environment variables, and an `env:` block in a task file.

use std::env;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the ARN partition.
pub const PARTITION_ENV: &str = "STATECRAFT_PARTITION";
/// Environment variable overriding the region.
pub const REGION_ENV: &str = "STATECRAFT_REGION";
/// Environment variable overriding the account id.
pub const ACCOUNT_ENV: &str = "STATECRAFT_ACCOUNT";

pub const DEFAULT_PARTITION: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";
/// Placeholder left in ARNs when no account is configured; deployment tooling substitutes it.
pub const ACCOUNT_PLACEHOLDER: &str = "${AWS::AccountId}";

/// Partition, region and account that task ARNs are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEnv {
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl Default for DeploymentEnv {
    fn default() -> Self {
        Self {
            partition: DEFAULT_PARTITION.to_string(),
            region: DEFAULT_REGION.to_string(),
            account: ACCOUNT_PLACEHOLDER.to_string(),
        }
    }
}

impl DeploymentEnv {
    pub fn new(partition: impl Into<String>, region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            region: region.into(),
            account: account.into(),
        }
    }

    /// Defaults overlaid with any non-empty `STATECRAFT_*` variables.
    pub fn from_env() -> Self {
        let mut resolved = Self::default();
        if let Some(partition) = non_empty_var(PARTITION_ENV) {
            resolved.partition = partition;
        }
        if let Some(region) = non_empty_var(REGION_ENV) {
            resolved.region = region;
        }
        if let Some(account) = non_empty_var(ACCOUNT_ENV) {
            resolved.account = account;
        }
        resolved
    }

    /// Apply file-level overrides on top of this environment.
    pub fn with_overrides(mut self, overrides: &EnvOverrides) -> Self {
        if let Some(partition) = &overrides.partition {
            self.partition = partition.clone();
        }
        if let Some(region) = &overrides.region {
            self.region = region.clone();
        }
        if let Some(account) = &overrides.account {
            self.account = account.clone();
        }
        self
    }

    /// Regional ARN: `arn:{partition}:{service}:{region}:{account}:{resource}`.
    pub fn arn(&self, service: &str, resource: &str) -> String {
        format!("arn:{}:{}:{}:{}:{}", self.partition, service, self.region, self.account, resource)
    }

    /// Global (region-less) ARN, as used by IAM.
    pub fn global_arn(&self, service: &str, resource: &str) -> String {
        format!("arn:{}:{}::{}:{}", self.partition, service, self.account, resource)
    }

    /// Resource ARN of an orchestrator service integration: `arn:{partition}:states:::{service}:{api}`.
    pub fn integration_resource(&self, service: &str, api: &str, suffix: &str) -> String {
        format!("arn:{}:states:::{}:{}{}", self.partition, service, api, suffix)
    }
}

/// Optional per-file overrides of the deployment environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvOverrides {
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
