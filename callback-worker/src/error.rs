//! Error types for each stage of the callback pipeline.
//!
//! Startup code wraps these in `anyhow` with context; the consumer keeps
//! them typed so it can tell which stage of a message failed.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration loading errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config file provided using the --config parameter")]
    NoSources,

    #[error("cannot read config file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is a directory, not a normal file")]
    IsDirectory(PathBuf),

    #[error("invalid configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Queue client errors (resolve, poll, delete).
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue '{0}' did not resolve to a url")]
    Unresolved(String),

    #[error("queue request failed: {0}")]
    Request(String),
}

/// Object store read errors.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("refusing to fetch an empty object key")]
    EmptyKey,

    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("reading object '{key}' failed: {reason}")]
    Transient { key: String, reason: String },
}

/// Document envelope decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document payload is empty")]
    Empty,

    #[error("malformed document envelope: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error("cannot render document: {0}")]
    Render(#[from] serde_json::Error),
}

/// Callback dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid callback url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("callback execution failed with non 200 status code {status}")]
    UnexpectedStatus { status: u16 },

    #[error("callback timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not execute callback: {0}")]
    Network(#[source] reqwest::Error),
}

/// Notification body errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("could not deserialize storage notification: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of one message delivery attempt, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("parse failed: {0}")]
    Parse(#[from] NotificationError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ProcessError {
    /// Short stage label used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessError::Parse(_) => "parse",
            ProcessError::Fetch(_) => "fetch",
            ProcessError::Decode(_) => "decode",
            ProcessError::Dispatch(_) => "dispatch",
        }
    }
}
