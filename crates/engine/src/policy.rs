//! Authorization statements required by a compiled task.
//!
//! When the target resource is only known at runtime, statements are scoped to
//! a wildcard instead of a concrete ARN. That over-grants within the service
//! but is the only scope that can match an unknown resource.

use statecraft_types::{DeploymentEnv, IntegrationPattern, PolicyStatement};
use tracing::debug;

use crate::task::Task;

/// Derive the statements `task` needs under `pattern`, primary action first, without duplicates.
pub fn derive_statements(task: &Task, pattern: IntegrationPattern, env: &DeploymentEnv) -> Vec<PolicyStatement> {
    let statements = dedupe_statements(task.kind.definition().policy_statements(pattern, env));
    debug!(statement_count = statements.len(), pattern = %pattern, "derived policy statements");
    statements
}

/// Drop repeated statements, keeping the first occurrence of each.
pub fn dedupe_statements(statements: Vec<PolicyStatement>) -> Vec<PolicyStatement> {
    let mut unique: Vec<PolicyStatement> = Vec::with_capacity(statements.len());
    for statement in statements {
        if !unique.contains(&statement) {
            unique.push(statement);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::StartJobRun;

    #[test]
    fn keeps_first_occurrence_order() {
        let a = PolicyStatement::allow(["svc:A"], ["*"]);
        let b = PolicyStatement::allow(["svc:B"], ["*"]);
        let deduped = dedupe_statements(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(deduped, vec![a, b]);
    }

    #[test]
    fn runtime_cluster_widens_every_statement() {
        let task: Task = StartJobRun::new("$.ClusterId", "s3://bucket/job.py")
            .with_execution_role("arn:aws:iam::123456789012:role/Job")
            .into();
        let statements = derive_statements(&task, IntegrationPattern::RunJob, &DeploymentEnv::default());
        assert_eq!(statements.len(), 3);
        assert!(statements[0].resources[0].ends_with(":/virtualclusters/*"));
        assert!(
            statements
                .iter()
                .flat_map(|statement| &statement.resources)
                .all(|resource| resource.contains(":/virtualclusters/*"))
        );
    }

    #[test]
    fn literal_cluster_scopes_job_runs_to_that_cluster() {
        let task: Task = StartJobRun::new("abc123", "s3://bucket/job.py")
            .with_execution_role("arn:aws:iam::123456789012:role/Job")
            .into();
        let statements = derive_statements(&task, IntegrationPattern::RunJob, &DeploymentEnv::default());
        assert_eq!(statements[1].resources, vec!["arn:aws:emr-containers:us-east-1:${AWS::AccountId}:/virtualclusters/abc123/jobruns/*"]);
        assert!(
            statements
                .iter()
                .flat_map(|statement| &statement.resources)
                .all(|resource| !resource.contains(":/virtualclusters/*"))
        );
    }
}
