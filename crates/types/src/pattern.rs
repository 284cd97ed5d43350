//! Service integration patterns (execution modes) for task states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValueError;

/// How the orchestrator waits on a service call made by a task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationPattern {
    /// Call the API and move on as soon as it responds.
    RequestResponse,
    /// Call the API and wait for the started work to finish.
    RunJob,
    /// Call the API with a task token and pause until the token is returned.
    WaitForTaskToken,
}

impl IntegrationPattern {
    pub const ALL: [IntegrationPattern; 3] = [Self::RequestResponse, Self::RunJob, Self::WaitForTaskToken];

    /// Canonical upper-case name (for example `RUN_JOB`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestResponse => "REQUEST_RESPONSE",
            Self::RunJob => "RUN_JOB",
            Self::WaitForTaskToken => "WAIT_FOR_TASK_TOKEN",
        }
    }

    /// Suffix appended to the task resource ARN.
    pub fn resource_suffix(&self) -> &'static str {
        match self {
            Self::RequestResponse => "",
            Self::RunJob => ".sync",
            Self::WaitForTaskToken => ".waitForTaskToken",
        }
    }
}

impl fmt::Display for IntegrationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationPattern {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|pattern| pattern.as_str() == normalized)
            .ok_or_else(|| ValueError::UnknownPattern { value: s.to_string() })
    }
}

/// Join patterns as a comma-separated list (`REQUEST_RESPONSE, RUN_JOB`).
pub fn join_patterns(patterns: &[IntegrationPattern]) -> String {
    patterns.iter().map(IntegrationPattern::as_str).collect::<Vec<_>>().join(", ")
}
