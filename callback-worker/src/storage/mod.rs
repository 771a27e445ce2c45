//! Object store access.
//!
//! The consumer only sees [`ObjectFetcher`]; [`S3Reader`] is the production
//! implementation. No retries happen here: failures go back to the caller.

pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

pub use s3::S3Reader;

/// Fetches a document's bytes by object key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Bytes, FetchError>;
}
