use std::path::Path;

use async_trait::async_trait;

/// One page of a bucket listing.
///
/// `truncated` reports that more keys remain; `next_continuation_token`
/// resumes the listing after this page when the backend provides one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub truncated: bool,
    pub next_continuation_token: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, String>;

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), String>;

    /// Creates or replaces the object stored under `key` with the content of
    /// the local file at `source`, streamed from disk.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<(), String>;
}
