//! In-memory collaborators for exercising the deploy handlers without AWS.
//!
//! Each fake records the calls it receives so tests can assert on request
//! counts and payloads, and supports injecting failures.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use site_deploy_core::invalidation::{DistributionSummary, InvalidationBatch, StackOutput};

use crate::adapters::cdn::CdnApi;
use crate::adapters::object_store::{ObjectPage, ObjectStore};
use crate::adapters::stack_outputs::StackOutputs;

/// Listing page capacity used by S3.
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct StoreState {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    list_calls: usize,
    delete_calls: usize,
    put_calls: usize,
}

/// Object store keeping buckets in sorted maps and paging listings by key.
pub struct InMemoryObjectStore {
    page_size: usize,
    state: Mutex<StoreState>,
    failing_put_keys: BTreeSet<String>,
    fail_deletes: bool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(StoreState::default()),
            failing_put_keys: BTreeSet::new(),
            fail_deletes: false,
        }
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default();
        self
    }

    pub fn failing_put_for(mut self, key: &str) -> Self {
        self.failing_put_keys.insert(key.to_string());
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
        self.lock().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    pub fn put_calls(&self) -> usize {
        self.lock().put_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("poisoned mutex")
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, String> {
        let mut state = self.lock();
        state.list_calls += 1;
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| format!("NoSuchBucket: {bucket}"))?;

        let lower = match continuation_token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };
        let mut remaining = objects.range((lower, Bound::Unbounded)).map(|(key, _)| key);
        let keys: Vec<String> = remaining.by_ref().take(self.page_size).cloned().collect();
        let truncated = remaining.next().is_some();

        Ok(ObjectPage {
            next_continuation_token: truncated.then(|| keys.last().cloned()).flatten(),
            keys,
            truncated,
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), String> {
        let mut state = self.lock();
        state.delete_calls += 1;
        if self.fail_deletes {
            return Err(format!("AccessDenied: cannot delete from {bucket}"));
        }
        if keys.is_empty() {
            return Err("MalformedXML: delete request names no objects".to_string());
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| format!("NoSuchBucket: {bucket}"))?;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<(), String> {
        let read = tokio::fs::read(source).await;
        let mut state = self.lock();
        state.put_calls += 1;
        if self.failing_put_keys.contains(key) {
            return Err(format!("simulated write failure for key: {key}"));
        }
        let body = read.map_err(|error| {
            format!("failed to open {} for upload: {error}", source.display())
        })?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| format!("NoSuchBucket: {bucket}"))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

/// Stack outputs served from a fixed map; unknown stacks fail like CloudFormation does.
#[derive(Default)]
pub struct StaticStackOutputs {
    stacks: BTreeMap<String, Vec<StackOutput>>,
    describe_calls: Mutex<Vec<String>>,
}

impl StaticStackOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(mut self, stack_name: &str, outputs: &[(&str, &str)]) -> Self {
        self.stacks.insert(
            stack_name.to_string(),
            outputs
                .iter()
                .map(|(key, value)| StackOutput {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn describe_calls(&self) -> Vec<String> {
        self.describe_calls.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl StackOutputs for StaticStackOutputs {
    async fn describe_stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>, String> {
        self.describe_calls
            .lock()
            .expect("poisoned mutex")
            .push(stack_name.to_string());
        self.stacks
            .get(stack_name)
            .cloned()
            .ok_or_else(|| format!("ValidationError: Stack with id {stack_name} does not exist"))
    }
}

/// CDN fake that captures every submitted invalidation.
#[derive(Default)]
pub struct RecordingCdn {
    distributions: Vec<DistributionSummary>,
    invalidations: Mutex<Vec<(String, InvalidationBatch)>>,
    fail_listing: bool,
    fail_invalidations: bool,
}

impl RecordingCdn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distribution(mut self, id: &str, domain_name: &str) -> Self {
        self.distributions.push(DistributionSummary {
            id: id.to_string(),
            domain_name: domain_name.to_string(),
        });
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_invalidations(mut self) -> Self {
        self.fail_invalidations = true;
        self
    }

    pub fn invalidations(&self) -> Vec<(String, InvalidationBatch)> {
        self.invalidations.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl CdnApi for RecordingCdn {
    async fn list_distributions(&self) -> Result<Vec<DistributionSummary>, String> {
        if self.fail_listing {
            return Err("Throttling: rate exceeded".to_string());
        }
        Ok(self.distributions.clone())
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        batch: &InvalidationBatch,
    ) -> Result<Option<String>, String> {
        if self.fail_invalidations {
            return Err(format!("AccessDenied: cannot invalidate {distribution_id}"));
        }
        let mut invalidations = self.invalidations.lock().expect("poisoned mutex");
        invalidations.push((distribution_id.to_string(), batch.clone()));
        Ok(Some(format!("I{}", invalidations.len())))
    }
}
