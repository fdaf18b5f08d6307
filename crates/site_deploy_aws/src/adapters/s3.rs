use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::adapters::object_store::{ObjectPage, ObjectStore};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(aws_sdk_s3::Client::new(config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, String> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to list objects in s3: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_string)
            .collect();

        Ok(ObjectPage {
            keys,
            truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), String> {
        let identifiers = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| format!("failed to build s3 delete request: {error}"))?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(|error| format!("failed to build s3 delete request: {error}"))?;

        let output = self
            .s3_client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to delete objects from s3: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        // Quiet mode only reports the keys that could not be deleted.
        if let Some(first) = output.errors().first() {
            return Err(format!(
                "failed to delete {} object(s) from s3, first '{}': {}",
                output.errors().len(),
                first.key().unwrap_or("<unknown>"),
                first.message().unwrap_or("no message"),
            ));
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
        let body = ByteStream::from_path(source).await.map_err(|error| {
            format!("failed to open {} for upload: {error}", source.display())
        })?;

        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                format!(
                    "failed to write object to s3: {}",
                    DisplayErrorContext(&error)
                )
            })
    }
}
