use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stack output holding the public domain of the site's distribution.
pub const DISTRIBUTION_DOMAIN_OUTPUT_KEY: &str = "WebAppCloudFrontDistributionOutput";
pub const ALL_PATHS: &str = "/*";
pub const CALLER_REFERENCE_PREFIX: &str = "site-deploy-";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionSummary {
    pub id: String,
    pub domain_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidationBatch {
    pub paths: Vec<String>,
    pub caller_reference: String,
}

impl InvalidationBatch {
    pub fn all_paths(caller_reference: impl Into<String>) -> Self {
        Self {
            paths: vec![ALL_PATHS.to_string()],
            caller_reference: caller_reference.into(),
        }
    }
}

pub fn caller_reference(now: DateTime<Utc>) -> String {
    format!("{CALLER_REFERENCE_PREFIX}{}", now.timestamp_millis())
}

/// Value of the distribution domain output, if the stack exposes one.
pub fn find_distribution_domain(outputs: &[StackOutput]) -> Option<&str> {
    outputs
        .iter()
        .find(|output| output.key == DISTRIBUTION_DOMAIN_OUTPUT_KEY)
        .map(|output| output.value.as_str())
}

/// First distribution serving `domain_name`.
///
/// Domains are expected to be unique per account; when they are not, the
/// earliest entry in listing order wins.
pub fn find_distribution<'a>(
    distributions: &'a [DistributionSummary],
    domain_name: &str,
) -> Option<&'a DistributionSummary> {
    distributions
        .iter()
        .find(|distribution| distribution.domain_name == domain_name)
}
