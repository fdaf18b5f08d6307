use chrono::Utc;
use serde::Serialize;
use site_deploy_core::error::DeployError;
use site_deploy_core::invalidation::{caller_reference, find_distribution, InvalidationBatch};
use tracing::info;

use crate::adapters::cdn::CdnApi;
use crate::handlers::domain::DomainResolver;

const COMPONENT: &str = "cache_invalidator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvalidationOutcome {
    DomainNotFound,
    DistributionNotFound {
        domain_name: String,
    },
    Submitted {
        distribution_id: String,
        invalidation_id: Option<String>,
        caller_reference: String,
    },
}

/// Invalidates every cached path of the distribution serving a stack's site.
pub struct CacheInvalidator<'a> {
    resolver: DomainResolver<'a>,
    cdn: &'a dyn CdnApi,
}

impl<'a> CacheInvalidator<'a> {
    pub fn new(resolver: DomainResolver<'a>, cdn: &'a dyn CdnApi) -> Self {
        Self { resolver, cdn }
    }

    pub async fn invalidate(&self, stack_name: &str) -> Result<InvalidationOutcome, DeployError> {
        self.invalidate_with_reference(stack_name, caller_reference(Utc::now()))
            .await
    }

    /// Missing domain output or an unmatched domain completes without a
    /// request; any collaborator failure becomes [`DeployError::Invalidation`].
    pub async fn invalidate_with_reference(
        &self,
        stack_name: &str,
        caller_reference: String,
    ) -> Result<InvalidationOutcome, DeployError> {
        let failed = |cause: String| DeployError::Invalidation {
            stack_name: stack_name.to_string(),
            cause,
        };

        let resolved = self
            .resolver
            .resolve_domain(stack_name)
            .await
            .map_err(|error| failed(error.to_string()))?;
        let Some(domain_name) = resolved else {
            info!(
                component = COMPONENT,
                stack_name, "distribution domain not found, skipping invalidation"
            );
            return Ok(InvalidationOutcome::DomainNotFound);
        };

        let distributions = self.cdn.list_distributions().await.map_err(&failed)?;
        let Some(distribution) = find_distribution(&distributions, &domain_name) else {
            info!(
                component = COMPONENT,
                stack_name,
                domain_name = %domain_name,
                distributions = distributions.len(),
                "no distribution serves domain, skipping invalidation"
            );
            return Ok(InvalidationOutcome::DistributionNotFound { domain_name });
        };

        let batch = InvalidationBatch::all_paths(caller_reference);
        let invalidation_id = self
            .cdn
            .create_invalidation(&distribution.id, &batch)
            .await
            .map_err(&failed)?;

        info!(
            component = COMPONENT,
            stack_name,
            distribution_id = %distribution.id,
            invalidation_id = invalidation_id.as_deref().unwrap_or("unknown"),
            caller_reference = %batch.caller_reference,
            "invalidation submitted"
        );

        Ok(InvalidationOutcome::Submitted {
            distribution_id: distribution.id.clone(),
            invalidation_id,
            caller_reference: batch.caller_reference,
        })
    }
}
