//! S3 implementation of the object store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ServerSideEncryption,
};
use aws_sdk_s3::Client as S3Client;
use std::collections::HashMap;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{CloudError, CloudResult};
use crate::store::{CreateOutcome, ObjectStore};

/// Object store backed by an S3 bucket.
///
/// Credentials come from the default provider chain; the client is built
/// once per store. When `kms_key_id` is set, every upload requests
/// server-side encryption under that key.
pub struct S3Store {
    client: S3Client,
    bucket: String,
    region: String,
    kms_key_id: Option<String>,
}

impl S3Store {
    /// Builds a store for the configured bucket and region, honoring an
    /// endpoint override (MinIO) with path-style addressing.
    pub async fn connect(config: &SyncConfig, kms_key_id: Option<String>) -> Self {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            kms_key_id,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> CloudResult<()> {
        let size = bytes.len();
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .set_metadata(Some(metadata));
        if let Some(kms_key) = &self.kms_key_id {
            req = req
                .server_side_encryption(ServerSideEncryption::AwsKms)
                .ssekms_key_id(kms_key);
        }

        req.send()
            .await
            .map_err(|e| CloudError::S3(format!("upload failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn object_metadata(&self, key: &str) -> CloudResult<Option<HashMap<String, String>>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => Ok(Some(resp.metadata().cloned().unwrap_or_default())),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(CloudError::S3(format!(
                        "head object failed for {key}: {service_err}"
                    )))
                }
            }
        }
    }

    async fn get_object(&self, key: &str) -> CloudResult<Option<Vec<u8>>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(CloudError::S3(format!(
                    "download failed for {key}: {service_err}"
                )));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| CloudError::S3(format!("failed to read body for {key}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{key}",
            bytes.len(),
            self.bucket
        );
        Ok(Some(bytes))
    }

    async fn list_keys(&self, prefix: &str) -> CloudResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation)
                .send()
                .await
                .map_err(|e| CloudError::S3(format!("list failed for prefix {prefix}: {e}")))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(str::to_string)),
            );

            match resp.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        Ok(keys)
    }

    async fn create_container(&self) -> CloudResult<CreateOutcome> {
        let bucket_config = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
            .build();

        match self
            .client
            .create_bucket()
            .acl(BucketCannedAcl::Private)
            .bucket(&self.bucket)
            .create_bucket_configuration(bucket_config)
            .send()
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_bucket_already_owned_by_you() {
                    Ok(CreateOutcome::AlreadyOwned)
                } else if service_err.is_bucket_already_exists() {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(CloudError::S3(format!(
                        "create bucket {} failed: {service_err}",
                        self.bucket
                    )))
                }
            }
        }
    }
}
