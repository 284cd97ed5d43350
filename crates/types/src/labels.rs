//! Open-ended string labels.
//!
//! Release labels and configuration classifications are open sets: the
//! service adds new values over time, so they are modeled as validated
//! strings with named constants for the well-known values rather than as
//! closed enums. Any non-empty label a caller supplies is accepted.

use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ValueError;

fn checked_label(kind: &'static str, label: String) -> Result<String, ValueError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ValueError::EmptyLabel { kind });
    }
    Ok(trimmed.to_string())
}

/// Release label selecting the container image runtime for a job run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReleaseLabel(String);

impl ReleaseLabel {
    pub const EMR_5_32_0: &'static str = "emr-5.32.0-latest";
    pub const EMR_5_33_0: &'static str = "emr-5.33.0-latest";
    pub const EMR_6_2_0: &'static str = "emr-6.2.0-latest";
    pub const EMR_6_3_0: &'static str = "emr-6.3.0-latest";
    pub const EMR_6_4_0: &'static str = "emr-6.4.0-latest";
    pub const EMR_6_5_0: &'static str = "emr-6.5.0-latest";
    pub const EMR_6_6_0: &'static str = "emr-6.6.0-latest";

    pub fn new(label: impl Into<String>) -> Result<Self, ValueError> {
        checked_label("release label", label.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReleaseLabel {
    fn default() -> Self {
        Self(Self::EMR_6_2_0.to_string())
    }
}

impl fmt::Display for ReleaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ReleaseLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ReleaseLabel::new(String::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// Classification of an application configuration block (for example `spark-defaults`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Classification(String);

impl Classification {
    pub const SPARK: &'static str = "spark";
    pub const SPARK_DEFAULTS: &'static str = "spark-defaults";
    pub const SPARK_ENV: &'static str = "spark-env";
    pub const SPARK_HIVE_SITE: &'static str = "spark-hive-site";
    pub const SPARK_LOG4J: &'static str = "spark-log4j";
    pub const SPARK_METRICS: &'static str = "spark-metrics";

    pub fn new(classification: impl Into<String>) -> Result<Self, ValueError> {
        checked_label("classification", classification.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Classification::new(String::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_labels_outside_the_named_set() {
        let label = ReleaseLabel::new("emr-7.0.0-latest").unwrap();
        assert_eq!(label.as_str(), "emr-7.0.0-latest");

        let classification = Classification::new(" custom-site ").unwrap();
        assert_eq!(classification.to_string(), "custom-site");
    }

    #[test]
    fn rejects_blank_labels() {
        assert!(matches!(ReleaseLabel::new("  "), Err(ValueError::EmptyLabel { kind: "release label" })));
        assert!(serde_yaml::from_str::<Classification>("\"\"").is_err());
    }

    #[test]
    fn default_release_label_is_emr_6_2() {
        assert_eq!(ReleaseLabel::default().as_str(), ReleaseLabel::EMR_6_2_0);
    }
}
