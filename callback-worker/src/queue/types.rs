//! Queue message types.

use std::fmt;

/// Resolved address of a queue, cached for the lifetime of the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle(String);

impl QueueHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message received from the notification queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message identifier
    pub id: String,
    /// Raw message body, expected to hold a storage event notification
    pub body: String,
    /// Opaque token required to delete this delivery
    pub ack_token: String,
}

impl QueueMessage {
    pub fn new(id: impl Into<String>, body: impl Into<String>, ack_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            ack_token: ack_token.into(),
        }
    }
}
