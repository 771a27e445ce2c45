//! Storage event notifications carried in queue message bodies.
//!
//! The body follows the S3 event format; only the first record is used:
//!
//! ```json
//! {"Records":[{"eventName":"ObjectCreated:Put","s3":{"object":{"key":"doc-1"}}}]}
//! ```

use serde::Deserialize;

use crate::error::NotificationError;

/// Event names starting with this prefix signal a newly created object.
pub const OBJECT_CREATED_PREFIX: &str = "ObjectCreated:";

#[derive(Debug, Deserialize)]
struct RawNotification {
    #[serde(rename = "Records", default)]
    records: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "eventName", default)]
    event_name: String,
    #[serde(default)]
    s3: RawS3Entity,
}

#[derive(Debug, Default, Deserialize)]
struct RawS3Entity {
    #[serde(default)]
    object: RawS3Object,
}

#[derive(Debug, Default, Deserialize)]
struct RawS3Object {
    #[serde(default)]
    key: String,
}

/// The part of a storage notification the consumer acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEventNotification {
    pub event_name: String,
    pub object_key: String,
}

impl StorageEventNotification {
    /// Parse a queue message body.
    ///
    /// Returns `Ok(None)` for well-formed bodies without records (such as
    /// the test event S3 sends when a notification is configured).
    pub fn parse(body: &str) -> Result<Option<Self>, NotificationError> {
        let raw: RawNotification = serde_json::from_str(body)?;

        Ok(raw.records.into_iter().next().map(|record| Self {
            event_name: record.event_name,
            object_key: record.s3.object.key,
        }))
    }

    pub fn is_object_created(&self) -> bool {
        self.event_name.starts_with(OBJECT_CREATED_PREFIX)
    }

    /// The object key to fetch, if this notification is worth acting on.
    pub fn actionable_key(&self) -> Option<&str> {
        if self.is_object_created() && !self.object_key.is_empty() {
            Some(&self.object_key)
        } else {
            None
        }
    }
}
