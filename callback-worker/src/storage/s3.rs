//! S3 implementation of [`ObjectFetcher`].

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::ObjectFetcher;
use crate::context::AppContext;
use crate::error::FetchError;

/// Reads objects from a single configured bucket.
#[derive(Clone)]
pub struct S3Reader {
    client: Client,
    bucket: String,
}

impl S3Reader {
    pub fn new(ctx: &AppContext) -> Self {
        let store = &ctx.config.s3;
        let s3_config = aws_sdk_s3::config::Builder::from(&ctx.aws)
            .force_path_style(store.force_path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: store.bucket.clone(),
        }
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectFetcher for S3Reader {
    async fn fetch(&self, key: &str) -> Result<Bytes, FetchError> {
        if key.is_empty() {
            return Err(FetchError::EmptyKey);
        }

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|service| service.is_no_such_key())
                    .unwrap_or(false);

                if not_found {
                    FetchError::NotFound {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                    }
                } else {
                    FetchError::Transient {
                        key: key.to_string(),
                        reason: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::Transient {
                key: key.to_string(),
                reason: e.to_string(),
            })?
            .into_bytes();

        debug!(bucket = %self.bucket, object_key = key, size_bytes = body.len(), "s3_object_read");
        Ok(body)
    }
}
