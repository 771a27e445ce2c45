//! Document envelope decoding.
//!
//! Decoding is all-or-nothing: malformed input never yields a partially
//! populated document.

pub mod types;

use prost::Message;

use crate::error::DecodeError;

pub use types::{IngestDocument, Topology, CALLBACK_URL_KEY};

/// Turns fetched bytes into a document.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<IngestDocument, DecodeError>;
}

/// Protobuf decoder for [`IngestDocument`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufDecoder;

impl DocumentDecoder for ProtobufDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<IngestDocument, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(IngestDocument::decode(bytes)?)
    }
}
