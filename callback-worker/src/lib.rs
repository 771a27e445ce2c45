//! Ingestion callback worker.
//!
//! Listens for storage notifications on a queue and, once a document has
//! landed in object storage, calls the callback url embedded in the
//! document.
//!
//! ## Architecture
//!
//! ```text
//! S3 → SQS notification → Consumer → S3 GetObject → decode → POST callback_url → delete message
//! ```

pub mod callback;
pub mod cli;
pub mod config;
pub mod consumer;
pub mod context;
pub mod document;
pub mod error;
pub mod queue;
pub mod storage;
pub mod telemetry;
pub mod web;

// Re-export commonly used types
pub use callback::{CallbackRequest, CallbackSender, HttpCallbackSender};
pub use config::Config;
pub use consumer::{
    Consumer, ConsumerDeps, ConsumerSettings, CycleReport, Disposition, MessageOutcome, SkipReason,
};
pub use context::AppContext;
pub use document::{DocumentDecoder, IngestDocument, ProtobufDecoder, Topology};
pub use queue::{QueueAcker, QueueHandle, QueueMessage, QueuePoller, QueueResolver, SqsQueue};
pub use storage::{ObjectFetcher, S3Reader};
