use std::path::Path;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use site_deploy_core::error::DeployError;
use site_deploy_core::local_tree::{LocalFile, LocalFileTree, TraversalError};
use tracing::{error, info};

use crate::adapters::object_store::ObjectStore;

const COMPONENT: &str = "bucket_synchronizer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub bucket: String,
    pub deleted_objects: usize,
    pub uploaded_objects: usize,
    pub uploaded_bytes: u64,
}

/// Replaces the contents of a bucket with the files of a local tree.
pub struct BucketSynchronizer<'a> {
    store: &'a dyn ObjectStore,
    upload_concurrency: usize,
}

impl<'a> BucketSynchronizer<'a> {
    pub fn new(store: &'a dyn ObjectStore, upload_concurrency: usize) -> Self {
        Self {
            store,
            upload_concurrency: upload_concurrency.max(1),
        }
    }

    /// Deletes every object in `bucket`, one bulk delete per listing page.
    ///
    /// Pages are processed strictly in sequence and the loop stops at the
    /// first empty or untruncated page. Returns the number of deleted objects.
    pub async fn clear_bucket(&self, bucket: &str) -> Result<usize, DeployError> {
        let mut continuation_token: Option<String> = None;
        let mut deleted_objects = 0usize;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .list_objects(bucket, continuation_token.as_deref())
                .await
                .map_err(|cause| clear_error(bucket, cause))?;

            if page.keys.is_empty() {
                break;
            }

            self.store
                .delete_objects(bucket, &page.keys)
                .await
                .map_err(|cause| clear_error(bucket, cause))?;

            pages += 1;
            deleted_objects += page.keys.len();
            info!(
                component = COMPONENT,
                bucket,
                page = pages,
                objects = page.keys.len(),
                "deleted object page"
            );

            if !page.truncated {
                break;
            }
            continuation_token = page.next_continuation_token;
        }

        info!(
            component = COMPONENT,
            bucket, pages, deleted_objects, "bucket cleared"
        );
        Ok(deleted_objects)
    }

    /// Clears `bucket`, then uploads every regular file under `local_root`
    /// keyed by its forward-slash relative path.
    ///
    /// The clear phase completes before the first upload starts. Uploads run
    /// with bounded parallelism and are all awaited; the first failure is
    /// returned once every upload has settled.
    pub async fn sync_directory(
        &self,
        bucket: &str,
        local_root: &Path,
    ) -> Result<SyncReport, DeployError> {
        let started_at = Instant::now();
        let root = local_root.display().to_string();

        let is_dir = tokio::fs::metadata(local_root)
            .await
            .map(|metadata| metadata.is_dir())
            .map_err(|error| DeployError::LocalTree {
                root: root.clone(),
                cause: error.to_string(),
            })?;
        if !is_dir {
            return Err(DeployError::LocalTree {
                root,
                cause: "not a directory".to_string(),
            });
        }

        let deleted_objects = self.clear_bucket(bucket).await?;

        let outcomes: Vec<Result<u64, DeployError>> =
            stream::iter(LocalFileTree::new(local_root).into_files())
                .map(|entry| self.upload_entry(bucket, &root, entry))
                .buffer_unordered(self.upload_concurrency)
                .collect()
                .await;

        let mut report = SyncReport {
            bucket: bucket.to_string(),
            deleted_objects,
            uploaded_objects: 0,
            uploaded_bytes: 0,
        };
        let mut first_failure = None;
        let mut failed_uploads = 0usize;
        for outcome in outcomes {
            match outcome {
                Ok(bytes) => {
                    report.uploaded_objects += 1;
                    report.uploaded_bytes += bytes;
                }
                Err(error) => {
                    failed_uploads += 1;
                    first_failure.get_or_insert(error);
                }
            }
        }

        if let Some(error) = first_failure {
            error!(
                component = COMPONENT,
                bucket,
                uploaded_objects = report.uploaded_objects,
                failed_uploads,
                "sync failed"
            );
            return Err(error);
        }

        info!(
            component = COMPONENT,
            bucket,
            deleted_objects = report.deleted_objects,
            uploaded_objects = report.uploaded_objects,
            uploaded_bytes = report.uploaded_bytes,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "sync completed"
        );
        Ok(report)
    }

    async fn upload_entry(
        &self,
        bucket: &str,
        root: &str,
        entry: Result<LocalFile, TraversalError>,
    ) -> Result<u64, DeployError> {
        let file = entry.map_err(|error| {
            error!(component = COMPONENT, root, error = %error, "local traversal failed");
            DeployError::LocalTree {
                root: root.to_string(),
                cause: error.to_string(),
            }
        })?;

        let bytes = match tokio::fs::metadata(&file.path).await {
            Ok(metadata) => metadata.len(),
            Err(read_error) => {
                let cause = format!("failed to read {}: {read_error}", file.path.display());
                error!(component = COMPONENT, bucket, key = %file.key, error = %cause, "upload failed");
                return Err(DeployError::Upload {
                    key: file.key,
                    cause,
                });
            }
        };

        match self
            .store
            .put_object(bucket, &file.key, &file.path, file.content_type)
            .await
        {
            Ok(()) => {
                info!(
                    component = COMPONENT,
                    bucket,
                    key = %file.key,
                    content_type = file.content_type,
                    bytes,
                    "uploaded object"
                );
                Ok(bytes)
            }
            Err(cause) => {
                error!(component = COMPONENT, bucket, key = %file.key, error = %cause, "upload failed");
                Err(DeployError::Upload {
                    key: file.key,
                    cause,
                })
            }
        }
    }
}

fn clear_error(bucket: &str, cause: String) -> DeployError {
    DeployError::BucketClear {
        bucket: bucket.to_string(),
        cause,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::test_helpers::InMemoryObjectStore;

    use super::*;

    const BUCKET: &str = "site-bucket";

    fn write_site(root: &Path) {
        fs::create_dir_all(root.join("assets/img")).expect("dirs should be created");
        fs::write(root.join("index.html"), b"<html>home</html>").expect("write should pass");
        fs::write(root.join("assets/app.css"), b"body{}").expect("write should pass");
        fs::write(root.join("assets/img/logo.png"), b"\x89PNG").expect("write should pass");
        fs::write(root.join("robots"), b"User-agent: *").expect("write should pass");
    }

    #[tokio::test]
    async fn clearing_empty_bucket_is_a_noop() {
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        let synchronizer = BucketSynchronizer::new(&store, 4);

        let deleted = synchronizer
            .clear_bucket(BUCKET)
            .await
            .expect("clear should succeed");
        let deleted_again = synchronizer
            .clear_bucket(BUCKET)
            .await
            .expect("second clear should succeed");

        assert_eq!(deleted, 0);
        assert_eq!(deleted_again, 0);
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn clearing_pages_through_truncated_listings() {
        let store = InMemoryObjectStore::with_page_size(1_000).with_bucket(BUCKET);
        for index in 0..1_050 {
            store.seed_object(BUCKET, &format!("obj-{index:05}"), b"x");
        }
        let synchronizer = BucketSynchronizer::new(&store, 4);

        let deleted = synchronizer
            .clear_bucket(BUCKET)
            .await
            .expect("clear should succeed");

        assert_eq!(deleted, 1_050);
        assert_eq!(store.list_calls(), 2);
        assert_eq!(store.delete_calls(), 2);
        assert!(store.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn clearing_exact_page_multiple_stops_after_last_page() {
        let store = InMemoryObjectStore::with_page_size(10).with_bucket(BUCKET);
        for index in 0..20 {
            store.seed_object(BUCKET, &format!("obj-{index:02}"), b"x");
        }
        let synchronizer = BucketSynchronizer::new(&store, 1);

        let deleted = synchronizer
            .clear_bucket(BUCKET)
            .await
            .expect("clear should succeed");

        assert_eq!(deleted, 20);
        assert_eq!(store.delete_calls(), 2);
        assert!(store.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_a_bucket_clear_error() {
        let store = InMemoryObjectStore::new();
        let synchronizer = BucketSynchronizer::new(&store, 1);

        let error = synchronizer
            .clear_bucket("missing-bucket")
            .await
            .expect_err("unknown bucket should fail");

        assert!(matches!(
            error,
            DeployError::BucketClear { ref bucket, .. } if bucket == "missing-bucket"
        ));
    }

    #[tokio::test]
    async fn delete_failure_aborts_sync_before_uploads() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_site(dir.path());
        let store = InMemoryObjectStore::new()
            .with_bucket(BUCKET)
            .failing_deletes();
        store.seed_object(BUCKET, "stale.html", b"old");
        let synchronizer = BucketSynchronizer::new(&store, 2);

        let error = synchronizer
            .sync_directory(BUCKET, dir.path())
            .await
            .expect_err("delete failure should abort");

        assert_eq!(error.kind(), "bucket_clear");
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn sync_mirrors_local_tree_exactly() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_site(dir.path());
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        store.seed_object(BUCKET, "stale.html", b"old");
        store.seed_object(BUCKET, "index.html", b"old home");
        let synchronizer = BucketSynchronizer::new(&store, 3);

        let report = synchronizer
            .sync_directory(BUCKET, dir.path())
            .await
            .expect("sync should succeed");

        assert_eq!(
            store.keys(BUCKET),
            vec![
                "assets/app.css".to_string(),
                "assets/img/logo.png".to_string(),
                "index.html".to_string(),
                "robots".to_string(),
            ]
        );
        assert_eq!(report.deleted_objects, 2);
        assert_eq!(report.uploaded_objects, 4);

        let index = store
            .object(BUCKET, "index.html")
            .expect("index should be uploaded");
        assert_eq!(index.body, b"<html>home</html>".to_vec());
        assert_eq!(index.content_type, "text/html");

        let robots = store
            .object(BUCKET, "robots")
            .expect("robots should be uploaded");
        assert_eq!(robots.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn upload_failure_names_key_and_settles_siblings() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        write_site(dir.path());
        let store = InMemoryObjectStore::new()
            .with_bucket(BUCKET)
            .failing_put_for("assets/app.css");
        let synchronizer = BucketSynchronizer::new(&store, 2);

        let error = synchronizer
            .sync_directory(BUCKET, dir.path())
            .await
            .expect_err("failed upload should surface");

        assert_eq!(
            error,
            DeployError::Upload {
                key: "assets/app.css".to_string(),
                cause: "simulated write failure for key: assets/app.css".to_string(),
            }
        );
        assert_eq!(store.put_calls(), 4);
        assert_eq!(store.keys(BUCKET).len(), 3);
    }

    #[tokio::test]
    async fn traversal_error_becomes_local_tree_error() {
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        let synchronizer = BucketSynchronizer::new(&store, 1);

        let error = synchronizer
            .upload_entry(
                BUCKET,
                "dist",
                Err(TraversalError {
                    path: "dist/private".to_string(),
                    message: "Permission denied (os error 13)".to_string(),
                }),
            )
            .await
            .expect_err("traversal error should surface");

        assert_eq!(
            error,
            DeployError::LocalTree {
                root: "dist".to_string(),
                cause: "failed to walk dist/private: Permission denied (os error 13)"
                    .to_string(),
            }
        );
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn unreadable_file_becomes_upload_error_naming_key() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        let synchronizer = BucketSynchronizer::new(&store, 1);
        let vanished = LocalFile {
            path: dir.path().join("gone.html"),
            key: "gone.html".to_string(),
            content_type: "text/html",
        };

        let error = synchronizer
            .upload_entry(BUCKET, "dist", Ok(vanished))
            .await
            .expect_err("missing file should fail");

        assert!(matches!(
            error,
            DeployError::Upload { ref key, ref cause }
                if key == "gone.html" && cause.starts_with("failed to read")
        ));
        assert_eq!(store.put_calls(), 0);
        assert!(store.keys(BUCKET).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_names_fail_sync_and_settle_siblings() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xff.txt")), b"one")
            .expect("write should pass");
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe.txt")), b"two")
            .expect("write should pass");
        fs::write(dir.path().join("index.html"), b"<html></html>").expect("write should pass");
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        let synchronizer = BucketSynchronizer::new(&store, 2);

        let error = synchronizer
            .sync_directory(BUCKET, dir.path())
            .await
            .expect_err("non-UTF-8 names should fail the sync");

        assert_eq!(error.kind(), "local_tree");
        assert!(error.to_string().contains("not valid UTF-8"));
        assert_eq!(store.put_calls(), 1);
        assert_eq!(store.keys(BUCKET), vec!["index.html".to_string()]);
    }

    #[tokio::test]
    async fn missing_local_root_leaves_bucket_untouched() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = InMemoryObjectStore::new().with_bucket(BUCKET);
        store.seed_object(BUCKET, "index.html", b"live");
        let synchronizer = BucketSynchronizer::new(&store, 2);

        let error = synchronizer
            .sync_directory(BUCKET, &dir.path().join("dist"))
            .await
            .expect_err("missing root should fail");

        assert_eq!(error.kind(), "local_tree");
        assert_eq!(store.keys(BUCKET), vec!["index.html".to_string()]);
        assert_eq!(store.list_calls(), 0);
    }
}
