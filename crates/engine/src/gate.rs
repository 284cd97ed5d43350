//! Integration pattern gate.

use statecraft_types::IntegrationPattern;
use tracing::debug;

use crate::error::CompileError;

/// Reject `pattern` unless it is one of `supported`.
///
/// Runs before field validation, so an unsupported pattern is reported even
/// when the task has other problems.
pub fn validate_pattern(pattern: IntegrationPattern, supported: &[IntegrationPattern]) -> Result<(), CompileError> {
    if supported.contains(&pattern) {
        debug!(pattern = %pattern, "integration pattern accepted");
        return Ok(());
    }
    Err(CompileError::UnsupportedPattern {
        supported: supported.to_vec(),
        received: pattern,
    })
}
