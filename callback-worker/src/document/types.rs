//! Ingest document envelope.
//!
//! Protobuf layout (fields not listed here are skipped on decode):
//!
//! ```text
//! IngestDocument { 1: int32 version, 2: uuid, 3: routing_key, 4: natural_id,
//!                  5: source, 6: document_date, 7: language_id, 8: Topology }
//! Topology       { 1: name, 2: map<string, string> configuration }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

/// Configuration key holding the callback target.
pub const CALLBACK_URL_KEY: &str = "callback_url";

/// A decoded ingest document.
#[derive(Clone, PartialEq, Serialize, prost::Message)]
#[serde(rename_all = "camelCase")]
pub struct IngestDocument {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(string, tag = "2")]
    pub uuid: String,
    #[prost(string, tag = "3")]
    pub routing_key: String,
    #[prost(string, tag = "4")]
    pub natural_id: String,
    #[prost(string, tag = "5")]
    pub source: String,
    #[prost(string, tag = "6")]
    pub document_date: String,
    #[prost(string, tag = "7")]
    pub language_id: String,
    #[prost(message, optional, tag = "8")]
    pub topology: Option<Topology>,
}

/// Processing topology the document was ingested under.
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct Topology {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(btree_map = "string, string", tag = "2")]
    pub configuration: BTreeMap<String, String>,
}

impl IngestDocument {
    /// Look up `topology.configuration["callback_url"]`.
    ///
    /// A missing topology or key is not an error; it means nobody asked to
    /// be called back for this document.
    pub fn callback_url(&self) -> Option<&str> {
        self.topology
            .as_ref()?
            .configuration
            .get(CALLBACK_URL_KEY)
            .map(String::as_str)
    }

    /// Canonical textual rendering sent as the callback payload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
