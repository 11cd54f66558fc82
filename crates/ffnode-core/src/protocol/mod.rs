//! Wire types exchanged with the host: inbound items and outbound records.
//!
//! Items and records mirror the workflow host's item shape: a free-form
//! `json` object, an optional `binary` map of named payloads, and (on
//! records) a `pairedItem` pointer back to the originating input position.
//! Field names are camelCase on the wire. Binary payloads carry their bytes
//! base64-encoded.

mod binary;

use serde::{Deserialize, Serialize};

use crate::probe::MediaInfo;

pub use self::binary::{BinaryMap, BinaryPayload};

/// One input item handed to the pipeline by the host.
///
/// # Example
///
/// ```
/// use ffnode_core::protocol::{BinaryPayload, Item};
///
/// let item = Item::with_binary("data", BinaryPayload::from_bytes(b"abc", Some("clip.mov"), None));
/// assert_eq!(item.first_binary().map(|(key, _)| key), Some("data"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default)]
    json: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BinaryMap::is_empty")]
    binary: BinaryMap,
}

impl Item {
    /// Creates an item without binary data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an item carrying a single named payload.
    #[must_use]
    pub fn with_binary(key: impl Into<String>, payload: BinaryPayload) -> Self {
        let mut binary = BinaryMap::new();
        binary.insert(key, payload);
        Self {
            json: serde_json::Map::new(),
            binary,
        }
    }

    /// Adds a named payload, keeping insertion order.
    #[must_use]
    pub fn and_binary(mut self, key: impl Into<String>, payload: BinaryPayload) -> Self {
        self.binary.insert(key, payload);
        self
    }

    /// Returns the item's JSON fields.
    #[must_use]
    pub const fn json(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.json
    }

    /// Returns the item's binary payloads in document order.
    #[must_use]
    pub const fn binary(&self) -> &BinaryMap {
        &self.binary
    }

    /// Returns the first payload that actually carries data.
    #[must_use]
    pub fn first_binary(&self) -> Option<(&str, &BinaryPayload)> {
        self.binary.iter().find(|(_, payload)| payload.has_data())
    }

    /// Returns the payload stored under `key` when it carries data.
    #[must_use]
    pub fn binary_named(&self, key: &str) -> Option<&BinaryPayload> {
        self.binary.get(key).filter(|payload| payload.has_data())
    }

    /// Returns every payload that carries data, in document order.
    pub fn binaries_with_data(&self) -> impl Iterator<Item = (&str, &BinaryPayload)> {
        self.binary.iter().filter(|(_, payload)| payload.has_data())
    }
}

/// Link from an output record back to its source item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairedItem {
    item: usize,
}

impl PairedItem {
    /// Points at the input item at `item`.
    #[must_use]
    pub const fn new(item: usize) -> Self {
        Self { item }
    }

    /// Position of the source item.
    #[must_use]
    pub const fn item(self) -> usize {
        self.item
    }
}

/// Descriptive metadata carried in a record's `json` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    /// Whether the item was processed successfully.
    pub success: bool,
    /// Size of the produced output file in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Name of the input file, for single-input operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file_name: Option<String>,
    /// Names of every merged input, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_file_names: Vec<String>,
    /// Name given to the produced output file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file_name: Option<String>,
    /// Fully rendered command line, including the tool name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// Failure text when the item failed under the continue policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Probe metadata produced by the info operation.
    #[serde(flatten)]
    pub media: Option<MediaInfo>,
}

/// One output record produced by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    json: RecordSummary,
    #[serde(default, skip_serializing_if = "BinaryMap::is_empty")]
    binary: BinaryMap,
    paired_item: PairedItem,
}

impl ResultRecord {
    /// Creates a record without binary output.
    #[must_use]
    pub const fn new(json: RecordSummary, paired_item: PairedItem) -> Self {
        Self {
            json,
            binary: BinaryMap::new(),
            paired_item,
        }
    }

    /// Attaches a named output payload.
    #[must_use]
    pub fn with_binary(mut self, key: impl Into<String>, payload: BinaryPayload) -> Self {
        self.binary.insert(key, payload);
        self
    }

    /// Returns the descriptive metadata.
    #[must_use]
    pub const fn json(&self) -> &RecordSummary {
        &self.json
    }

    /// Returns the output payloads.
    #[must_use]
    pub const fn binary(&self) -> &BinaryMap {
        &self.binary
    }

    /// Returns the source item link.
    #[must_use]
    pub const fn paired_item(&self) -> PairedItem {
        self.paired_item
    }
}

#[cfg(test)]
mod tests;
