//! Entries, values and trees as the Browse API returns them
//!
//! These are plain data with serde derives matching the JSON wire shape:
//!
//! ```text
//! Tree  { "path": [Key], "entries": [Entry] }
//! Entry { "bucket": bool, "key": Key, "value": Value? }
//! Value { "hex": "...", "pretty": { "content_type": "...", "text": "..." }? }
//! ```

use crate::key::Key;
use crate::path::KeyPath;
use serde::{Deserialize, Serialize};

/// Readable rendering of a value in a recognized format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pretty {
    pub content_type: String,
    pub text: String,
}

/// Opaque payload of a leaf entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    #[serde(rename = "hex", with = "hex::serde")]
    bytes: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty: Option<Pretty>,
}

impl Value {
    /// Wrap raw bytes, sniffing a pretty rendering
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let pretty = crate::display::prettify(&bytes);
        Self { bytes, pretty }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Label for the detected format: the content type, or `unknown`
    #[must_use]
    pub fn format(&self) -> &str {
        self.pretty.as_ref().map_or("unknown", |p| p.content_type.as_str())
    }
}

/// One sibling inside a bucket
///
/// Buckets never carry a value; deserializing one that does fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryRepr")]
pub struct Entry {
    pub bucket: bool,
    pub key: Key,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl Entry {
    /// A nested bucket
    #[must_use]
    pub const fn bucket(key: Key) -> Self {
        Self {
            bucket: true,
            key,
            value: None,
        }
    }

    /// A leaf holding `value`
    #[must_use]
    pub const fn leaf(key: Key, value: Value) -> Self {
        Self {
            bucket: false,
            key,
            value: Some(value),
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

#[derive(Deserialize)]
struct EntryRepr {
    bucket: bool,
    key: Key,
    #[serde(default)]
    value: Option<Value>,
}

impl TryFrom<EntryRepr> for Entry {
    type Error = String;

    fn try_from(repr: EntryRepr) -> Result<Self, Self::Error> {
        if repr.bucket && repr.value.is_some() {
            return Err(format!("bucket {} carries a value", repr.key));
        }
        Ok(Self {
            bucket: repr.bucket,
            key: repr.key,
            value: repr.value,
        })
    }
}

/// One page of siblings under `path`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tree {
    pub path: KeyPath,
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_format_label() {
        assert_eq!(Value::from_bytes(b"{}".to_vec()).format(), "json");
        assert_eq!(Value::from_bytes(b"hello".to_vec()).format(), "string");
        assert_eq!(Value::from_bytes(vec![0u8, 1, 2]).format(), "unknown");
    }

    #[test]
    fn test_tree_wire_form() {
        let json = r#"{
            "path": [{"hex": "61", "str": "a"}],
            "entries": [
                {"bucket": true, "key": {"hex": "ff"}},
                {"bucket": false, "key": {"hex": "78", "str": "x"},
                 "value": {"hex": "7b7d", "pretty": {"content_type": "json", "text": "{}"}}}
            ]
        }"#;
        let tree: Tree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.path.len(), 1);
        assert!(tree.entries[0].bucket);
        assert!(tree.entries[0].value().is_none());
        assert_eq!(tree.entries[1].value().unwrap().as_bytes(), b"{}");
        assert_eq!(tree.entries[1].value().unwrap().format(), "json");
    }

    #[test]
    fn test_bucket_with_value_is_rejected() {
        let json = r#"{"bucket": true, "key": {"hex": "ff"}, "value": {"hex": "00"}}"#;
        assert!(serde_json::from_str::<Entry>(json).is_err());
    }

    #[test]
    fn test_entry_serializes_without_absent_value() {
        let json = serde_json::to_string(&Entry::bucket(Key::from_text("a"))).unwrap();
        assert_eq!(json, r#"{"bucket":true,"key":{"hex":"61","str":"a"}}"#);
    }
}
