//! Start a Spark job run on a virtual cluster.
//!
//! When no execution role is given, the job runs under a role named after the
//! virtual cluster, which the trust-policy collaborator registers with the
//! cluster's namespace. That only works when the cluster id is a literal; a
//! runtime cluster id therefore requires an explicit role.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value, json};
use statecraft_types::{
    ApplicationConfiguration, DeploymentEnv, IntegrationPattern, JsonPath, Monitoring, PolicyStatement, ReleaseLabel, Resolvable,
};

use super::{TaskDefinition, virtual_cluster_arn};
use crate::compile::TrustPolicyRequest;
use crate::error::CompileError;
use crate::render::{insert_optional_str, insert_resolvable, render_application_config, render_tag_list};
use crate::validate::{
    ENTRY_POINT_LENGTH, NAME_LENGTH, SPARK_SUBMIT_PARAMETERS_LENGTH, check_resolvable_length, validate_application_config,
    validate_entry_point_arguments, validate_tags,
};

const SUPPORTED_PATTERNS: &[IntegrationPattern] = &[IntegrationPattern::RequestResponse, IntegrationPattern::RunJob];

/// Prefix of the role name used when no execution role is supplied.
pub const GENERATED_ROLE_PREFIX: &str = "statecraft-job-role-";

/// Spark application launched with `spark-submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkSubmitJobDriver {
    /// Application entry point (script or jar URI).
    pub entry_point: Resolvable<String>,
    /// Arguments passed to the entry point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point_arguments: Option<Resolvable<Vec<Value>>>,
    /// Extra `spark-submit` flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_parameters: Option<Resolvable<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDriver {
    pub spark_submit: SparkSubmitJobDriver,
}

/// Starts a job run on an existing virtual cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartJobRun {
    pub virtual_cluster_id: Resolvable<String>,
    #[serde(default)]
    pub job_name: Option<Resolvable<String>>,
    /// ARN of the role the job runs as.
    #[serde(default)]
    pub execution_role_arn: Option<String>,
    #[serde(default)]
    pub release_label: ReleaseLabel,
    pub job_driver: JobDriver,
    #[serde(default)]
    pub application_config: Option<Vec<ApplicationConfiguration>>,
    #[serde(default)]
    pub monitoring: Option<Monitoring>,
    #[serde(default)]
    pub tags: Option<IndexMap<String, String>>,
}

impl StartJobRun {
    pub fn new(virtual_cluster_id: impl Into<Resolvable<String>>, entry_point: impl Into<Resolvable<String>>) -> Self {
        Self {
            virtual_cluster_id: virtual_cluster_id.into(),
            job_name: None,
            execution_role_arn: None,
            release_label: ReleaseLabel::default(),
            job_driver: JobDriver {
                spark_submit: SparkSubmitJobDriver {
                    entry_point: entry_point.into(),
                    entry_point_arguments: None,
                    spark_submit_parameters: None,
                },
            },
            application_config: None,
            monitoring: None,
            tags: None,
        }
    }

    pub fn with_job_name(mut self, name: impl Into<Resolvable<String>>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    pub fn with_execution_role(mut self, role_arn: impl Into<String>) -> Self {
        self.execution_role_arn = Some(role_arn.into());
        self
    }

    pub fn with_release_label(mut self, label: ReleaseLabel) -> Self {
        self.release_label = label;
        self
    }

    pub fn with_entry_point_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let arguments = arguments.into_iter().map(|argument| Value::String(argument.into())).collect();
        self.job_driver.spark_submit.entry_point_arguments = Some(Resolvable::Literal(arguments));
        self
    }

    pub fn with_entry_point_arguments_ref(mut self, path: JsonPath) -> Self {
        self.job_driver.spark_submit.entry_point_arguments = Some(Resolvable::RuntimeRef(path));
        self
    }

    pub fn with_spark_submit_parameters(mut self, parameters: impl Into<Resolvable<String>>) -> Self {
        self.job_driver.spark_submit.spark_submit_parameters = Some(parameters.into());
        self
    }

    pub fn with_application_config(mut self, configuration: ApplicationConfiguration) -> Self {
        self.application_config.get_or_insert_with(Vec::new).push(configuration);
        self
    }

    pub fn with_monitoring(mut self, monitoring: Monitoring) -> Self {
        self.monitoring = Some(monitoring);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(IndexMap::new).insert(key.into(), value.into());
        self
    }

    /// The role the job runs as: the explicit role, or the generated role for a literal cluster id.
    pub fn execution_role(&self, env: &DeploymentEnv) -> Option<String> {
        if let Some(role_arn) = &self.execution_role_arn {
            return Some(role_arn.clone());
        }
        self.virtual_cluster_id
            .as_literal()
            .map(|cluster_id| env.global_arn("iam", &format!("role/{GENERATED_ROLE_PREFIX}{cluster_id}")))
    }

    /// Trust-policy work needed before the job can run, if the role is generated.
    pub fn trust_policy_request(&self, env: &DeploymentEnv) -> Option<TrustPolicyRequest> {
        if self.execution_role_arn.is_some() {
            return None;
        }
        let cluster_id = self.virtual_cluster_id.as_literal()?;
        Some(TrustPolicyRequest {
            virtual_cluster_id: cluster_id.clone(),
            role_arn: self.execution_role(env)?,
        })
    }

    fn validate_monitoring(monitoring: &Monitoring) -> Result<(), CompileError> {
        if let Some(log_group) = &monitoring.log_group
            && log_group.trim().is_empty()
        {
            return Err(CompileError::invalid_value("monitoring.logGroup", "cannot be empty"));
        }
        if monitoring.log_stream_name_prefix.is_some() && monitoring.log_group.is_none() {
            return Err(CompileError::invalid_value(
                "monitoring.logStreamNamePrefix",
                "requires monitoring.logGroup to be set",
            ));
        }
        if let Some(uri) = &monitoring.log_bucket_uri
            && !uri.starts_with("s3://")
        {
            return Err(CompileError::invalid_value("monitoring.logBucketUri", format!("'{uri}' is not an s3:// URI")));
        }
        Ok(())
    }

    fn render_monitoring(monitoring: &Monitoring) -> Value {
        let mut rendered = JsonMap::new();
        if let Some(log_group) = &monitoring.log_group {
            let mut cloud_watch = JsonMap::new();
            cloud_watch.insert("LogGroupName".to_string(), json!(log_group));
            insert_optional_str(&mut cloud_watch, "LogStreamNamePrefix", monitoring.log_stream_name_prefix.as_deref());
            rendered.insert("CloudWatchMonitoringConfiguration".to_string(), Value::Object(cloud_watch));
        }
        if let Some(persistent) = monitoring.persistent_app_ui {
            let state = if persistent { "ENABLED" } else { "DISABLED" };
            rendered.insert("PersistentAppUI".to_string(), json!(state));
        }
        if let Some(uri) = &monitoring.log_bucket_uri {
            rendered.insert("S3MonitoringConfiguration".to_string(), json!({ "LogUri": uri }));
        }
        Value::Object(rendered)
    }
}

impl TaskDefinition for StartJobRun {
    fn operation(&self) -> &'static str {
        "startJobRun"
    }

    fn supported_patterns(&self) -> &'static [IntegrationPattern] {
        SUPPORTED_PATTERNS
    }

    fn default_pattern(&self) -> IntegrationPattern {
        IntegrationPattern::RunJob
    }

    fn validate(&self) -> Result<(), CompileError> {
        if self.execution_role_arn.is_none() && self.virtual_cluster_id.is_runtime_ref() {
            return Err(CompileError::MissingExecutionRole);
        }

        let driver = &self.job_driver.spark_submit;
        check_resolvable_length("entryPoint", &driver.entry_point, ENTRY_POINT_LENGTH)?;
        if let Some(arguments) = &driver.entry_point_arguments {
            validate_entry_point_arguments(arguments)?;
        }
        if let Some(parameters) = &driver.spark_submit_parameters {
            check_resolvable_length("sparkSubmitParameters", parameters, SPARK_SUBMIT_PARAMETERS_LENGTH)?;
        }
        if let Some(job_name) = &self.job_name {
            check_resolvable_length("jobName", job_name, NAME_LENGTH)?;
        }
        if let Some(configurations) = &self.application_config {
            validate_application_config(configurations, 0)?;
        }
        if let Some(monitoring) = &self.monitoring {
            Self::validate_monitoring(monitoring)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    fn render_parameters(&self, env: &DeploymentEnv) -> JsonMap<String, Value> {
        let mut parameters = JsonMap::new();
        insert_resolvable(&mut parameters, "VirtualClusterId", &self.virtual_cluster_id);
        if let Some(job_name) = &self.job_name {
            insert_resolvable(&mut parameters, "Name", job_name);
        }
        insert_optional_str(&mut parameters, "ExecutionRoleArn", self.execution_role(env).as_deref());
        parameters.insert("ReleaseLabel".to_string(), json!(self.release_label.as_str()));

        let driver = &self.job_driver.spark_submit;
        let mut spark_submit = JsonMap::new();
        insert_resolvable(&mut spark_submit, "EntryPoint", &driver.entry_point);
        if let Some(arguments) = &driver.entry_point_arguments {
            insert_resolvable(&mut spark_submit, "EntryPointArguments", arguments);
        }
        if let Some(parameters) = &driver.spark_submit_parameters {
            insert_resolvable(&mut spark_submit, "SparkSubmitParameters", parameters);
        }
        parameters.insert("JobDriver".to_string(), json!({ "SparkSubmitJobDriver": spark_submit }));

        let mut overrides = JsonMap::new();
        if let Some(configurations) = &self.application_config {
            overrides.insert("ApplicationConfiguration".to_string(), render_application_config(configurations));
        }
        if let Some(monitoring) = self.monitoring.as_ref().filter(|monitoring| !monitoring.is_empty()) {
            overrides.insert("MonitoringConfiguration".to_string(), Self::render_monitoring(monitoring));
        }
        if !overrides.is_empty() {
            parameters.insert("ConfigurationOverrides".to_string(), Value::Object(overrides));
        }

        if let Some(tags) = &self.tags {
            parameters.insert("Tags".to_string(), render_tag_list(tags));
        }
        parameters
    }

    fn policy_statements(&self, pattern: IntegrationPattern, env: &DeploymentEnv) -> Vec<PolicyStatement> {
        let cluster_arn = virtual_cluster_arn(self.virtual_cluster_id.as_literal().map(String::as_str), env);

        let mut start = PolicyStatement::allow(["emr-containers:StartJobRun"], [cluster_arn.clone()]);
        if let Some(role_arn) = self.execution_role(env) {
            start = start.with_condition("StringEquals", "emr-containers:ExecutionRoleArn", role_arn);
        }
        let mut statements = vec![start];

        if pattern == IntegrationPattern::RunJob {
            let job_runs = format!("{cluster_arn}/jobruns/*");
            statements.push(PolicyStatement::allow(["emr-containers:DescribeJobRun"], [job_runs.clone()]));
            statements.push(PolicyStatement::allow(["emr-containers:CancelJobRun"], [job_runs]));
        }
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statecraft_types::Classification;

    const ROLE: &str = "arn:aws:iam::123456789012:role/JobExecutionRole";

    fn env() -> DeploymentEnv {
        DeploymentEnv::new("aws", "us-east-1", "123456789012")
    }

    fn pi_job() -> StartJobRun {
        StartJobRun::new("abc123", "local:///usr/lib/spark/examples/src/main/python/pi.py").with_execution_role(ROLE)
    }

    #[test]
    fn missing_role_with_runtime_cluster_always_fails() {
        let task = StartJobRun::new("$.ClusterId", "");
        assert_eq!(task.validate().unwrap_err(), CompileError::MissingExecutionRole);

        let task = StartJobRun::new("$.ClusterId", "s3://bucket/job.py").with_spark_submit_parameters("");
        assert_eq!(task.validate().unwrap_err(), CompileError::MissingExecutionRole);
    }

    #[test]
    fn literal_cluster_without_role_uses_generated_role() {
        let task = StartJobRun::new("abc123", "s3://bucket/job.py");
        assert!(task.validate().is_ok());
        assert_eq!(
            task.execution_role(&env()).as_deref(),
            Some("arn:aws:iam::123456789012:role/statecraft-job-role-abc123")
        );
        let request = task.trust_policy_request(&env()).unwrap();
        assert_eq!(request.virtual_cluster_id, "abc123");

        assert!(pi_job().trust_policy_request(&env()).is_none());
    }

    #[test]
    fn field_bounds() {
        assert!(matches!(
            StartJobRun::new("abc123", "").with_execution_role(ROLE).validate(),
            Err(CompileError::Length { .. })
        ));
        assert!(matches!(pi_job().with_spark_submit_parameters("").validate(), Err(CompileError::Length { .. })));
        assert!(matches!(pi_job().with_job_name("j".repeat(65)).validate(), Err(CompileError::Length { .. })));
        assert!(pi_job().with_job_name("$.name").validate().is_ok());
        assert!(StartJobRun::new("abc123", "$.entry").with_execution_role(ROLE).validate().is_ok());
    }

    #[test]
    fn runtime_submit_parameters_render_as_reference() {
        let job = pi_job().with_spark_submit_parameters("$.SubmitParams");
        assert!(job.validate().is_ok());

        let parameters = job.render_parameters(&env());
        let driver = &parameters["JobDriver"]["SparkSubmitJobDriver"];
        assert_eq!(driver["SparkSubmitParameters.$"], "$.SubmitParams");
        assert!(driver.get("SparkSubmitParameters").is_none());
    }

    #[test]
    fn monitoring_rules() {
        let monitoring = Monitoring {
            log_stream_name_prefix: Some("spark".to_string()),
            ..Default::default()
        };
        assert!(pi_job().with_monitoring(monitoring).validate().is_err());

        let monitoring = Monitoring {
            log_bucket_uri: Some("https://bucket".to_string()),
            ..Default::default()
        };
        assert!(pi_job().with_monitoring(monitoring).validate().is_err());
    }

    #[test]
    fn renders_full_parameter_document() {
        let task = pi_job()
            .with_job_name("pi")
            .with_release_label(ReleaseLabel::new(ReleaseLabel::EMR_6_3_0).unwrap())
            .with_entry_point_arguments(["2"])
            .with_spark_submit_parameters("--conf spark.executor.instances=2")
            .with_application_config(
                ApplicationConfiguration::new(Classification::new(Classification::SPARK_DEFAULTS).unwrap())
                    .with_property("spark.executor.memory", "2G"),
            )
            .with_monitoring(Monitoring {
                log_group: Some("/emr/jobs".to_string()),
                log_stream_name_prefix: Some("pi".to_string()),
                log_bucket_uri: Some("s3://logs/pi".to_string()),
                persistent_app_ui: Some(true),
            })
            .with_tag("team", "data");

        assert_eq!(
            Value::Object(task.render_parameters(&env())),
            json!({
                "VirtualClusterId": "abc123",
                "Name": "pi",
                "ExecutionRoleArn": ROLE,
                "ReleaseLabel": "emr-6.3.0-latest",
                "JobDriver": {
                    "SparkSubmitJobDriver": {
                        "EntryPoint": "local:///usr/lib/spark/examples/src/main/python/pi.py",
                        "EntryPointArguments": ["2"],
                        "SparkSubmitParameters": "--conf spark.executor.instances=2"
                    }
                },
                "ConfigurationOverrides": {
                    "ApplicationConfiguration": [{
                        "Classification": "spark-defaults",
                        "Properties": {"spark.executor.memory": "2G"}
                    }],
                    "MonitoringConfiguration": {
                        "CloudWatchMonitoringConfiguration": {"LogGroupName": "/emr/jobs", "LogStreamNamePrefix": "pi"},
                        "PersistentAppUI": "ENABLED",
                        "S3MonitoringConfiguration": {"LogUri": "s3://logs/pi"}
                    }
                },
                "Tags": [{"Key": "team", "Value": "data"}]
            })
        );
    }

    #[test]
    fn omits_absent_optional_fields() {
        let parameters = pi_job().render_parameters(&env());
        let keys: Vec<_> = parameters.keys().cloned().collect();
        assert_eq!(keys, vec!["VirtualClusterId", "ExecutionRoleArn", "ReleaseLabel", "JobDriver"]);
        assert_eq!(parameters["JobDriver"], json!({"SparkSubmitJobDriver": {"EntryPoint": "local:///usr/lib/spark/examples/src/main/python/pi.py"}}));
    }

    #[test]
    fn runtime_values_use_suffixed_keys() {
        let task = StartJobRun::new("$.ClusterId", "$.entry")
            .with_execution_role(ROLE)
            .with_entry_point_arguments_ref(JsonPath::new("$.args").unwrap());
        let parameters = task.render_parameters(&env());

        assert_eq!(parameters["VirtualClusterId.$"], "$.ClusterId");
        assert!(!parameters.contains_key("VirtualClusterId"));
        let driver = &parameters["JobDriver"]["SparkSubmitJobDriver"];
        assert_eq!(driver["EntryPoint.$"], "$.entry");
        assert_eq!(driver["EntryPointArguments.$"], "$.args");
    }

    #[test]
    fn policy_per_pattern() {
        let statements = pi_job().policy_statements(IntegrationPattern::RequestResponse, &env());
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].actions, vec!["emr-containers:StartJobRun"]);
        assert_eq!(
            statements[0].resources,
            vec!["arn:aws:emr-containers:us-east-1:123456789012:/virtualclusters/abc123"]
        );
        let conditions = statements[0].conditions.as_ref().unwrap();
        assert_eq!(conditions["StringEquals"]["emr-containers:ExecutionRoleArn"], ROLE);

        let statements = pi_job().policy_statements(IntegrationPattern::RunJob, &env());
        let actions: Vec<_> = statements.iter().flat_map(|statement| statement.actions.clone()).collect();
        assert_eq!(
            actions,
            vec!["emr-containers:StartJobRun", "emr-containers:DescribeJobRun", "emr-containers:CancelJobRun"]
        );
        assert_eq!(
            statements[1].resources,
            vec!["arn:aws:emr-containers:us-east-1:123456789012:/virtualclusters/abc123/jobruns/*"]
        );
    }
}
