use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 8;
pub const MAX_UPLOAD_CONCURRENCY: usize = 256;

/// Raw deploy settings as they arrive from a config file or the command line.
///
/// Every field is optional so that file values and CLI overrides can be
/// layered before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeployConfigFile {
    pub bucket_name: Option<String>,
    pub local_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub service: Option<String>,
    pub stage: Option<String>,
    pub upload_concurrency: Option<usize>,
}

impl DeployConfigFile {
    pub fn from_json_file(path: &Path) -> Result<Self, ValidationError> {
        let text = fs::read_to_string(path).map_err(|error| {
            ValidationError::new(format!(
                "Failed to read config file '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_json_str(&text).map_err(|error| {
            ValidationError::new(format!("{} (in '{}')", error.message(), path.display()))
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text)
            .map_err(|error| ValidationError::new(format!("Malformed config: {error}")))
    }

    /// Layers `overrides` on top of `self`; any value present in `overrides` wins.
    pub fn merged_with(self, overrides: DeployConfigFile) -> DeployConfigFile {
        DeployConfigFile {
            bucket_name: overrides.bucket_name.or(self.bucket_name),
            local_path: overrides.local_path.or(self.local_path),
            profile: overrides.profile.or(self.profile),
            region: overrides.region.or(self.region),
            service: overrides.service.or(self.service),
            stage: overrides.stage.or(self.stage),
            upload_concurrency: overrides.upload_concurrency.or(self.upload_concurrency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub bucket: Option<String>,
    pub local_root: Option<PathBuf>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub service: Option<String>,
    pub stage: String,
    pub upload_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub bucket: String,
    pub local_root: PathBuf,
}

impl DeployConfig {
    /// Name of the infrastructure stack deployed for this service and stage.
    pub fn stack_name(&self) -> Result<String, ValidationError> {
        let service = self.service.as_deref().ok_or_else(|| {
            ValidationError::new("service is required for domain-info and invalidate-cache")
        })?;
        Ok(stack_name(service, &self.stage))
    }

    pub fn require_sync_target(&self) -> Result<SyncTarget, ValidationError> {
        let bucket = self
            .bucket
            .clone()
            .ok_or_else(|| ValidationError::new("bucketName is required for sync-to-s3"))?;
        let local_root = self
            .local_root
            .clone()
            .ok_or_else(|| ValidationError::new("localPath is required for sync-to-s3"))?;
        Ok(SyncTarget { bucket, local_root })
    }
}

pub fn stack_name(service: &str, stage: &str) -> String {
    format!("{service}-{stage}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn normalize_config(raw: DeployConfigFile) -> Result<DeployConfig, ValidationError> {
    let stage = non_empty(raw.stage).unwrap_or_else(|| DEFAULT_STAGE.to_string());

    let upload_concurrency = raw
        .upload_concurrency
        .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY);
    if upload_concurrency == 0 {
        return Err(ValidationError::new(
            "uploadConcurrency must be a positive integer",
        ));
    }
    if upload_concurrency > MAX_UPLOAD_CONCURRENCY {
        return Err(ValidationError::new(format!(
            "uploadConcurrency exceeds MAX_UPLOAD_CONCURRENCY={MAX_UPLOAD_CONCURRENCY}"
        )));
    }

    let local_root = match raw.local_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(ValidationError::new("localPath cannot be empty"));
        }
        other => other,
    };

    Ok(DeployConfig {
        bucket: non_empty(raw.bucket_name),
        local_root,
        profile: non_empty(raw.profile),
        region: non_empty(raw.region),
        service: non_empty(raw.service),
        stage,
        upload_concurrency,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
