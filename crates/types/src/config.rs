//! Job configuration overrides: application configuration trees and monitoring.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::labels::Classification;

/// One node of an application configuration tree.
///
/// Properties and nested nodes keep authoring order so the rendered task is
/// stable across compilations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfiguration {
    /// Configuration classification such as `spark-defaults`.
    pub classification: Classification,
    /// Property overrides for this classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, String>>,
    /// Child configurations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Vec<ApplicationConfiguration>>,
}

impl ApplicationConfiguration {
    pub fn new(classification: Classification) -> Self {
        Self {
            classification,
            properties: None,
            nested: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.get_or_insert_with(IndexMap::new).insert(key.into(), value.into());
        self
    }

    pub fn with_nested(mut self, child: ApplicationConfiguration) -> Self {
        self.nested.get_or_insert_with(Vec::new).push(child);
        self
    }
}

/// Where a job run ships its logs and whether the persistent application UI is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitoring {
    /// CloudWatch log group receiving driver and executor logs.
    #[serde(default)]
    pub log_group: Option<String>,
    /// Prefix for log stream names inside `log_group`.
    #[serde(default)]
    pub log_stream_name_prefix: Option<String>,
    /// S3 URI receiving job logs.
    #[serde(default)]
    pub log_bucket_uri: Option<String>,
    /// Keep the Spark history UI after the job finishes.
    #[serde(default)]
    pub persistent_app_ui: Option<bool>,
}

impl Monitoring {
    /// True when no monitoring option is set.
    pub fn is_empty(&self) -> bool {
        self.log_group.is_none()
            && self.log_stream_name_prefix.is_none()
            && self.log_bucket_uri.is_none()
            && self.persistent_app_ui.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_property_order() {
        let config = ApplicationConfiguration::new(Classification::new(Classification::SPARK_DEFAULTS).unwrap())
            .with_property("spark.executor.memory", "2G")
            .with_property("spark.driver.cores", "1")
            .with_property("spark.dynamicAllocation.enabled", "false");

        let keys: Vec<_> = config.properties.as_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["spark.executor.memory", "spark.driver.cores", "spark.dynamicAllocation.enabled"]);
    }

    #[test]
    fn deserializes_nested_tree() {
        let yaml = r#"
classification: spark-env
nested:
  - classification: export
    properties:
      PYSPARK_PYTHON: /usr/bin/python3
"#;
        let config: ApplicationConfiguration = serde_yaml::from_str(yaml).unwrap();
        let nested = config.nested.as_ref().unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].classification.as_str(), "export");
        assert!(config.properties.is_none());
    }

    #[test]
    fn empty_monitoring_detected() {
        assert!(Monitoring::default().is_empty());
        let monitoring = Monitoring {
            persistent_app_ui: Some(false),
            ..Default::default()
        };
        assert!(!monitoring.is_empty());
    }
}
