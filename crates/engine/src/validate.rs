//! Structural limits on task fields.
//!
//! Each rule is independent and only ever inspects literal values. Values
//! resolved at runtime are accepted unchecked; the service enforces its own
//! limits once the orchestrator substitutes them.

use indexmap::IndexMap;
use serde_json::Value;
use statecraft_types::{ApplicationConfiguration, JsonPath, Resolvable};
use tracing::debug;

use crate::error::CompileError;
use crate::task::{StateOptions, Task};

/// Inclusive character bounds of a job driver entry point.
pub const ENTRY_POINT_LENGTH: (usize, usize) = (1, 256);
/// Inclusive bounds of the serialized entry point argument list, in bytes.
pub const ENTRY_POINT_ARGUMENTS_LENGTH: (usize, usize) = (1, 10280);
/// Inclusive character bounds of the spark-submit parameter string.
pub const SPARK_SUBMIT_PARAMETERS_LENGTH: (usize, usize) = (1, 102_400);
/// Inclusive character bounds of job and virtual cluster names.
pub const NAME_LENGTH: (usize, usize) = (1, 64);
/// Maximum configurations at any single level of an application configuration tree.
pub const MAX_CONFIGURATIONS: usize = 100;
/// Maximum properties on a single configuration node.
pub const MAX_PROPERTIES: usize = 100;
/// Maximum tags on a task resource.
pub const MAX_TAGS: usize = 50;

/// Validate every field-level rule of `task`.
///
/// The integration pattern is gated separately by [`crate::validate_pattern`].
pub fn validate_task(task: &Task) -> Result<(), CompileError> {
    task.kind.definition().validate()?;
    validate_state_options(&task.options)?;
    debug!(operation = task.kind.definition().operation(), "task fields validated");
    Ok(())
}

/// Check that a literal string has a character length within `bounds`.
pub fn check_length(field: &str, text: &str, bounds: (usize, usize)) -> Result<(), CompileError> {
    let (min, max) = bounds;
    let actual = text.chars().count();
    if actual < min || actual > max {
        return Err(CompileError::length(field, actual, min, max));
    }
    Ok(())
}

/// Check a possibly runtime-resolved string; runtime references always pass.
pub fn check_resolvable_length(field: &str, value: &Resolvable<String>, bounds: (usize, usize)) -> Result<(), CompileError> {
    match value.as_literal() {
        Some(text) => check_length(field, text, bounds),
        None => Ok(()),
    }
}

/// Check that a collection has at most `max` entries.
pub fn check_max_entries(field: &str, actual: usize, max: usize) -> Result<(), CompileError> {
    if actual > max {
        return Err(CompileError::too_many_entries(field, actual, max));
    }
    Ok(())
}

/// Entry point arguments must be strings and fit within the serialized size bound.
pub fn validate_entry_point_arguments(arguments: &Resolvable<Vec<Value>>) -> Result<(), CompileError> {
    const FIELD: &str = "entryPointArguments";

    let Some(arguments) = arguments.as_literal() else {
        return Ok(());
    };

    if let Some((index, element)) = arguments.iter().enumerate().find(|(_, element)| !element.is_string()) {
        return Err(CompileError::type_mismatch(
            FIELD,
            "an array of strings",
            format!("{} at index {}", json_type_name(element), index),
        ));
    }

    let serialized = serde_json::to_string(arguments).map_err(|error| CompileError::invalid_value(FIELD, error.to_string()))?;
    let (min, max) = ENTRY_POINT_ARGUMENTS_LENGTH;
    if serialized.len() < min || serialized.len() > max {
        return Err(CompileError::length(FIELD, serialized.len(), min, max));
    }
    Ok(())
}

/// Validate one level of an application configuration tree and recurse into its children.
///
/// `depth` is zero for the top-level list and only affects the field name
/// reported in errors.
pub fn validate_application_config(configurations: &[ApplicationConfiguration], depth: usize) -> Result<(), CompileError> {
    let field = if depth == 0 { "applicationConfig" } else { "applicationConfig.nested" };
    check_max_entries(field, configurations.len(), MAX_CONFIGURATIONS)?;

    for configuration in configurations {
        if let Some(properties) = &configuration.properties {
            check_max_entries("applicationConfig.properties", properties.len(), MAX_PROPERTIES)?;
        }
        if let Some(nested) = &configuration.nested {
            validate_application_config(nested, depth + 1)?;
        }
    }
    Ok(())
}

/// Tag maps are limited in size and may not contain empty keys.
pub fn validate_tags(tags: &IndexMap<String, String>) -> Result<(), CompileError> {
    check_max_entries("tags", tags.len(), MAX_TAGS)?;
    if tags.keys().any(|key| key.trim().is_empty()) {
        return Err(CompileError::invalid_value("tags", "tag keys cannot be empty"));
    }
    Ok(())
}

/// Paths must be `$`-rooted reference paths, and timeouts positive with the heartbeat below the timeout.
pub fn validate_state_options(options: &StateOptions) -> Result<(), CompileError> {
    let paths = [
        ("inputPath", &options.input_path),
        ("outputPath", &options.output_path),
        ("resultPath", &options.result_path),
    ];
    for (field, path) in paths {
        let Some(path) = path else {
            continue;
        };
        if !JsonPath::new(path.as_str())?.is_reference() {
            return Err(CompileError::invalid_value(field, "intrinsic functions are not allowed here"));
        }
    }

    if options.timeout_seconds == Some(0) {
        return Err(CompileError::invalid_value("timeoutSeconds", "must be greater than zero"));
    }
    if options.heartbeat_seconds == Some(0) {
        return Err(CompileError::invalid_value("heartbeatSeconds", "must be greater than zero"));
    }
    if let (Some(timeout), Some(heartbeat)) = (options.timeout_seconds, options.heartbeat_seconds)
        && heartbeat >= timeout
    {
        return Err(CompileError::invalid_value(
            "heartbeatSeconds",
            format!("heartbeat ({heartbeat}s) must be shorter than the timeout ({timeout}s)"),
        ));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
