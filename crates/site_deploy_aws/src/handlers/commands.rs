//! The three deploy commands exposed to the host.
//!
//! Each command receives the validated [`DeployConfig`] and the collaborator
//! handles built for this invocation, runs one component, and logs any
//! failure with the affected resource before handing it back.

use serde::Serialize;
use site_deploy_core::config::{DeployConfig, ValidationError};
use site_deploy_core::error::DeployError;
use site_deploy_core::invalidation::ALL_PATHS;
use tracing::{error, info_span, Instrument};

use crate::adapters::cdn::CdnApi;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::stack_outputs::StackOutputs;
use crate::handlers::domain::DomainResolver;
use crate::handlers::invalidate::{CacheInvalidator, InvalidationOutcome};
use crate::handlers::sync::{BucketSynchronizer, SyncReport};

pub const SYNC_TO_S3: &str = "sync-to-s3";
pub const DOMAIN_INFO: &str = "domain-info";
pub const INVALIDATE_CACHE: &str = "invalidate-cache";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl CommandError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Deploy(error) => error.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainInfo {
    pub stack_name: String,
    pub domain_name: Option<String>,
}

pub async fn sync_to_s3(
    config: &DeployConfig,
    store: &dyn ObjectStore,
) -> Result<SyncReport, CommandError> {
    let run = async {
        let target = config.require_sync_target()?;
        let synchronizer = BucketSynchronizer::new(store, config.upload_concurrency);
        let report = synchronizer
            .sync_directory(&target.bucket, &target.local_root)
            .await?;
        Ok::<_, CommandError>(report)
    };

    run.instrument(info_span!("command", name = SYNC_TO_S3))
        .await
        .map_err(|error| log_failure(SYNC_TO_S3, error))
}

pub async fn domain_info(
    config: &DeployConfig,
    stacks: &dyn StackOutputs,
) -> Result<DomainInfo, CommandError> {
    let stack_name = config
        .stack_name()
        .map_err(|error| log_failure(DOMAIN_INFO, error.into()))?;
    let run = async {
        let domain_name = DomainResolver::new(stacks)
            .resolve_domain(&stack_name)
            .await?;
        Ok::<_, CommandError>(DomainInfo {
            stack_name: stack_name.clone(),
            domain_name,
        })
    };

    run.instrument(info_span!("command", name = DOMAIN_INFO, stack_name = %stack_name))
        .await
        .map_err(|error| log_failure(DOMAIN_INFO, error))
}

pub async fn invalidate_cache(
    config: &DeployConfig,
    stacks: &dyn StackOutputs,
    cdn: &dyn CdnApi,
) -> Result<InvalidationOutcome, CommandError> {
    let stack_name = config
        .stack_name()
        .map_err(|error| log_failure(INVALIDATE_CACHE, error.into()))?;
    let run = async {
        let invalidator = CacheInvalidator::new(DomainResolver::new(stacks), cdn);
        Ok::<_, CommandError>(invalidator.invalidate(&stack_name).await?)
    };

    run.instrument(info_span!("command", name = INVALIDATE_CACHE, stack_name = %stack_name))
        .await
        .map_err(|error| log_failure(INVALIDATE_CACHE, error))
}

pub fn render_sync_report(report: &SyncReport) -> String {
    format!(
        "Synced {} file(s) ({} bytes) to s3://{}, removed {} previous object(s)",
        report.uploaded_objects, report.uploaded_bytes, report.bucket, report.deleted_objects
    )
}

pub fn render_domain_info(info: &DomainInfo) -> String {
    match &info.domain_name {
        Some(domain_name) => format!("Domain: {domain_name}"),
        None => format!("Domain not found for stack {}", info.stack_name),
    }
}

pub fn render_invalidation_outcome(stack_name: &str, outcome: &InvalidationOutcome) -> String {
    match outcome {
        InvalidationOutcome::DomainNotFound => {
            format!("Domain not found for stack {stack_name}, nothing to invalidate")
        }
        InvalidationOutcome::DistributionNotFound { domain_name } => {
            format!("No distribution serves {domain_name}, nothing to invalidate")
        }
        InvalidationOutcome::Submitted {
            distribution_id,
            invalidation_id,
            ..
        } => format!(
            "Invalidation {} submitted for distribution {distribution_id} (paths: {ALL_PATHS})",
            invalidation_id.as_deref().unwrap_or("<pending>")
        ),
    }
}

fn log_failure(command: &str, error: CommandError) -> CommandError {
    error!(command, kind = error.kind(), error = %error, "command failed");
    error
}
