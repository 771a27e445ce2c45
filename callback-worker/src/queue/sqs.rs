//! SQS implementation of the queue capabilities.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;
use tracing::{debug, info, warn};

use super::types::{QueueHandle, QueueMessage};
use super::{QueueAcker, QueuePoller, QueueResolver};
use crate::context::AppContext;
use crate::error::QueueError;

/// SQS client wrapper implementing resolve, poll and ack.
#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: Client::new(&ctx.aws),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueResolver for SqsQueue {
    async fn resolve(&self, name: &str) -> Result<QueueHandle, QueueError> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| QueueError::Request(DisplayErrorContext(&e).to_string()))?;

        let url = output
            .queue_url()
            .ok_or_else(|| QueueError::Unresolved(name.to_string()))?;

        info!(queue = name, queue_url = url, "sqs_queue_resolved");
        Ok(QueueHandle::new(url))
    }
}

#[async_trait]
impl QueuePoller for SqsQueue {
    async fn poll(
        &self,
        queue: &QueueHandle,
        max_messages: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue.as_str())
            .max_number_of_messages(max_messages)
            .send()
            .await
            .map_err(|e| QueueError::Request(DisplayErrorContext(&e).to_string()))?;

        let messages: Vec<QueueMessage> = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(into_queue_message)
            .collect();

        debug!(queue_url = %queue, received = messages.len(), "sqs_messages_received");
        Ok(messages)
    }
}

#[async_trait]
impl QueueAcker for SqsQueue {
    async fn ack(&self, queue: &QueueHandle, ack_token: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue.as_str())
            .receipt_handle(ack_token)
            .send()
            .await
            .map_err(|e| QueueError::Request(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// Convert an SQS message, dropping deliveries that cannot be acknowledged.
fn into_queue_message(message: Message) -> Option<QueueMessage> {
    let id = message.message_id().unwrap_or("unknown").to_string();

    let Some(receipt_handle) = message.receipt_handle() else {
        warn!(message_id = %id, "sqs_message_missing_receipt_handle");
        return None;
    };

    Some(QueueMessage::new(
        id,
        message.body().unwrap_or_default(),
        receipt_handle,
    ))
}
