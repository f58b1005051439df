//! S3 implementation of [`ObjectStore`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sftp_bucket_core::contract::{BoxError, ObjectStore};
use tracing::debug;

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(aws: &SdkConfig) -> Self {
        Self {
            client: Client::new(aws),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        body: Vec<u8>,
    ) -> Result<(), BoxError> {
        debug!("Uploading {} ({} bytes) to {}", object_name, body.len(), bucket);
        self.client
            .put_object()
            .bucket(bucket)
            .key(object_name)
            .body(ByteStream::from(body))
            .content_type("application/gzip")
            .send()
            .await
            .map_err(|e| format!("Put object failed: {e}"))?;
        debug!("Successfully uploaded to s3://{}/{}", bucket, object_name);
        Ok(())
    }
}
