//! Binary payloads and the order-preserving map that holds them.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named binary attachment: base64 bytes plus descriptive metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BinaryPayload {
    #[serde(default)]
    data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_size: Option<u64>,
}

impl BinaryPayload {
    /// Wraps already base64-encoded data.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Encodes raw bytes and records their length.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], file_name: Option<&str>, mime_type: Option<&str>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            file_name: file_name.map(str::to_owned),
            mime_type: mime_type.map(str::to_owned),
            file_size: u64::try_from(bytes.len()).ok(),
        }
    }

    /// Sets the original file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the declared MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Base64 transport form of the bytes.
    #[must_use]
    pub const fn data(&self) -> &str {
        self.data.as_str()
    }

    /// Original file name, when the host supplied one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Declared MIME type, when the host supplied one.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Size in bytes, when known.
    #[must_use]
    pub const fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Whether the payload carries any data at all.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// Decodes the base64 data.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when `data` is not valid standard base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.as_bytes())
    }
}

/// Binary payloads keyed by name, kept in document order.
///
/// The host's binary map is a JSON object; which payload counts as "first"
/// depends on key order, so the map is stored as an ordered list rather than
/// a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryMap {
    entries: Vec<(String, BinaryPayload)>,
}

impl BinaryMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces a payload; replacement keeps the original slot.
    pub fn insert(&mut self, key: impl Into<String>, payload: BinaryPayload) {
        let name = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = payload;
            return;
        }
        self.entries.push((name, payload));
    }

    /// Looks up a payload by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BinaryPayload> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, payload)| payload)
    }

    /// Iterates over entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BinaryPayload)> {
        self.entries
            .iter()
            .map(|(key, payload)| (key.as_str(), payload))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for BinaryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, payload) in &self.entries {
            map.serialize_entry(key, payload)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BinaryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BinaryMapVisitor)
    }
}

struct BinaryMapVisitor;

impl<'de> Visitor<'de> for BinaryMapVisitor {
    type Value = BinaryMap;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of binary payloads")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(BinaryMap::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BinaryMap::new();
        while let Some((key, payload)) = access.next_entry::<String, BinaryPayload>()? {
            map.insert(key, payload);
        }
        Ok(map)
    }
}
