//! Authorization statements attached to the orchestrator's runtime role.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Statement effect. Task policies only ever grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    #[default]
    Allow,
}

/// Condition block keyed by operator (`StringEquals`), then by condition key.
pub type Conditions = IndexMap<String, IndexMap<String, String>>;

/// A single IAM-style policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
}

impl PolicyStatement {
    /// Allow `actions` on `resources` with no conditions.
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
            conditions: None,
        }
    }

    /// Add a `operator: { key: value }` condition to the statement.
    pub fn with_condition(mut self, operator: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions
            .get_or_insert_with(IndexMap::new)
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}
