use async_trait::async_trait;
use site_deploy_core::invalidation::{DistributionSummary, InvalidationBatch};

#[async_trait]
pub trait CdnApi: Send + Sync {
    /// Every distribution visible to the account, in listing order.
    async fn list_distributions(&self) -> Result<Vec<DistributionSummary>, String>;

    /// Submits `batch` and returns the invalidation id when the API reports one.
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        batch: &InvalidationBatch,
    ) -> Result<Option<String>, String>;
}
