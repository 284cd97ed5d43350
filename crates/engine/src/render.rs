//! Task state rendering.
//!
//! Output objects are built with `serde_json::Map` (insertion ordered), so
//! keys appear in the order they are inserted here and two renders of the
//! same task are identical. Absent optional fields are never inserted.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value, json};
use statecraft_types::{ApplicationConfiguration, DeploymentEnv, IntegrationPattern, Resolvable};
use tracing::debug;

use crate::task::{SERVICE, Task};

/// Render the complete task state document for `task` under `pattern`.
///
/// Assumes the task has already passed the pattern gate and validation.
pub fn render_state(task: &Task, pattern: IntegrationPattern, env: &DeploymentEnv) -> Value {
    let definition = task.kind.definition();
    let resource = env.integration_resource(SERVICE, definition.operation(), pattern.resource_suffix());
    let parameters = definition.render_parameters(env);
    debug!(resource = %resource, parameter_count = parameters.len(), "rendered task parameters");

    let options = &task.options;
    let mut state = JsonMap::new();
    state.insert("Type".to_string(), json!("Task"));
    insert_optional_str(&mut state, "Comment", options.comment.as_deref());
    insert_optional_str(&mut state, "InputPath", options.input_path.as_deref());
    state.insert("Resource".to_string(), Value::String(resource));
    state.insert("Parameters".to_string(), Value::Object(parameters));
    insert_optional_str(&mut state, "OutputPath", options.output_path.as_deref());
    insert_optional_str(&mut state, "ResultPath", options.result_path.as_deref());
    if let Some(timeout) = options.timeout_seconds {
        state.insert("TimeoutSeconds".to_string(), json!(timeout));
    }
    if let Some(heartbeat) = options.heartbeat_seconds {
        state.insert("HeartbeatSeconds".to_string(), json!(heartbeat));
    }
    Value::Object(state)
}

/// Insert `key` (or `key.$` for runtime references) for a resolvable value.
pub(crate) fn insert_resolvable<T>(target: &mut JsonMap<String, Value>, key: &str, value: &Resolvable<T>)
where
    T: Clone + Into<Value>,
{
    let (key, value) = value.to_parameter(key);
    target.insert(key, value);
}

pub(crate) fn insert_optional_str(target: &mut JsonMap<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        target.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Render a configuration tree, preserving sibling and property order.
pub(crate) fn render_application_config(configurations: &[ApplicationConfiguration]) -> Value {
    Value::Array(configurations.iter().map(render_configuration_node).collect())
}

fn render_configuration_node(configuration: &ApplicationConfiguration) -> Value {
    let mut node = JsonMap::new();
    node.insert("Classification".to_string(), Value::String(configuration.classification.to_string()));
    if let Some(properties) = &configuration.properties {
        node.insert("Properties".to_string(), render_tag_map(properties));
    }
    if let Some(nested) = &configuration.nested {
        node.insert("Configurations".to_string(), render_application_config(nested));
    }
    Value::Object(node)
}

/// Tags as a `[{"Key": .., "Value": ..}]` list in insertion order.
pub(crate) fn render_tag_list(tags: &IndexMap<String, String>) -> Value {
    Value::Array(tags.iter().map(|(key, value)| json!({ "Key": key, "Value": value })).collect())
}

/// A string map rendered inline as a JSON object in insertion order.
pub(crate) fn render_tag_map(tags: &IndexMap<String, String>) -> Value {
    Value::Object(tags.iter().map(|(key, value)| (key.clone(), Value::String(value.clone()))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use statecraft_types::Classification;

    use crate::task::{DeleteVirtualCluster, StateOptions};

    #[test]
    fn state_document_layout() {
        let task = Task::from(DeleteVirtualCluster::new("abc123")).with_options(StateOptions {
            comment: Some("remove cluster".to_string()),
            result_path: Some("$.Deleted".to_string()),
            timeout_seconds: Some(600),
            ..Default::default()
        });
        let state = render_state(&task, IntegrationPattern::RequestResponse, &DeploymentEnv::default());

        let keys: Vec<_> = state.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Type", "Comment", "Resource", "Parameters", "ResultPath", "TimeoutSeconds"]);
        assert_eq!(state["Resource"], "arn:aws:states:::emr-containers:deleteVirtualCluster");
    }

    #[test]
    fn tag_list_keeps_insertion_order() {
        let mut tags = IndexMap::new();
        tags.insert("zeta".to_string(), "1".to_string());
        tags.insert("alpha".to_string(), "2".to_string());

        assert_eq!(
            render_tag_list(&tags),
            json!([{"Key": "zeta", "Value": "1"}, {"Key": "alpha", "Value": "2"}])
        );
        let inline = render_tag_map(&tags);
        let keys: Vec<_> = inline.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn configuration_tree_renders_recursively() {
        let tree = vec![
            ApplicationConfiguration::new(Classification::new(Classification::SPARK_ENV).unwrap()).with_nested(
                ApplicationConfiguration::new(Classification::new("export").unwrap()).with_property("PYSPARK_PYTHON", "python3"),
            ),
        ];
        assert_eq!(
            render_application_config(&tree),
            json!([{
                "Classification": "spark-env",
                "Configurations": [{
                    "Classification": "export",
                    "Properties": {"PYSPARK_PYTHON": "python3"}
                }]
            }])
        );
    }
}
