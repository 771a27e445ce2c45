//! Queue module for notification consumption.
//!
//! This module provides:
//! - Message and notification types
//! - Narrow capability traits for resolving, polling and acknowledging
//! - The SQS implementation of those traits
//!
//! ## Architecture
//!
//! ```text
//! S3 event → SQS queue → QueuePoller → Consumer → QueueAcker (delete)
//! ```

pub mod notification;
pub mod sqs;
pub mod types;

use async_trait::async_trait;

use crate::error::QueueError;

pub use notification::{StorageEventNotification, OBJECT_CREATED_PREFIX};
pub use sqs::SqsQueue;
pub use types::{QueueHandle, QueueMessage};

/// Resolves a queue name to the handle used by every later call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<QueueHandle, QueueError>;
}

/// Receives batches of messages. An empty batch is not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueuePoller: Send + Sync {
    async fn poll(
        &self,
        queue: &QueueHandle,
        max_messages: i32,
    ) -> Result<Vec<QueueMessage>, QueueError>;
}

/// Acknowledges (deletes) a message so it is not redelivered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueAcker: Send + Sync {
    async fn ack(&self, queue: &QueueHandle, ack_token: &str) -> Result<(), QueueError>;
}
