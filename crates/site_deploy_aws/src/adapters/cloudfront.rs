use async_trait::async_trait;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch as CloudFrontInvalidationBatch, Paths};
use site_deploy_core::invalidation::{DistributionSummary, InvalidationBatch};

use crate::adapters::cdn::CdnApi;

#[derive(Debug, Clone)]
pub struct CloudFrontCdn {
    cloudfront_client: aws_sdk_cloudfront::Client,
}

impl CloudFrontCdn {
    pub fn new(cloudfront_client: aws_sdk_cloudfront::Client) -> Self {
        Self { cloudfront_client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(aws_sdk_cloudfront::Client::new(config))
    }
}

#[async_trait]
impl CdnApi for CloudFrontCdn {
    async fn list_distributions(&self) -> Result<Vec<DistributionSummary>, String> {
        let mut distributions = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .cloudfront_client
                .list_distributions()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|error| {
                    format!(
                        "failed to list cloudfront distributions: {}",
                        DisplayErrorContext(&error)
                    )
                })?;

            let Some(list) = output.distribution_list() else {
                break;
            };

            distributions.extend(list.items().iter().map(|summary| DistributionSummary {
                id: summary.id().to_string(),
                domain_name: summary.domain_name().to_string(),
            }));

            match list.next_marker() {
                Some(next) if list.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(distributions)
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        batch: &InvalidationBatch,
    ) -> Result<Option<String>, String> {
        let quantity = i32::try_from(batch.paths.len())
            .map_err(|_| "invalidation batch has too many paths".to_string())?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(batch.paths.clone()))
            .build()
            .map_err(|error| format!("failed to build invalidation paths: {error}"))?;
        let invalidation_batch = CloudFrontInvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&batch.caller_reference)
            .build()
            .map_err(|error| format!("failed to build invalidation batch: {error}"))?;

        let output = self
            .cloudfront_client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(invalidation_batch)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to create cloudfront invalidation: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        Ok(output
            .invalidation()
            .map(|invalidation| invalidation.id().to_string()))
    }
}
