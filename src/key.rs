//! Keys of the bucket store
//!
//! A [`Key`] addresses one entry inside a bucket. On the wire a key travels as
//! `{"hex": "...", "str": "..."}`: the hex form is always present, the string
//! form only when the raw bytes are displayable text. Whichever form was used
//! to build the key is its native form; the other is derived from it.
//!
//! Equality, ordering and hashing are defined on the canonical bytes, so a
//! string key and a hex key spelling the same bytes are the same key.
//!
//! # Examples
//!
//! ```
//! use bucketview::key::Key;
//!
//! let text = Key::from_text("a");
//! let raw = Key::from_hex("61").unwrap();
//! assert_eq!(text, raw);
//! assert_eq!(text.hex(), "61");
//! assert!(Key::from_hex("6").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use unicode_general_category::{GeneralCategory, get_general_category};

/// Key-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Hex text with odd length or a non-hex character
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// Neither a hex nor a string form was supplied
    #[error("Key has neither a hex nor a string form")]
    Empty,
}

/// A single key inside a bucket
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "KeyRepr", into = "KeyRepr")]
pub struct Key {
    bytes: Vec<u8>,
    text: Option<String>,
}

impl Key {
    /// Build a key whose native form is a UTF-8 string
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            bytes: text.as_bytes().to_vec(),
            text: Some(text),
        }
    }

    /// Build a key whose native form is raw bytes given as hex
    ///
    /// Both lower and upper case digits are accepted.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::MalformedKey` if the input has an odd length or
    /// contains a character that is not a hex digit.
    pub fn from_hex(hex_text: &str) -> Result<Self, KeyError> {
        let bytes =
            hex::decode(hex_text).map_err(|e| KeyError::MalformedKey(format!("{hex_text}: {e}")))?;
        Ok(Self { bytes, text: None })
    }

    /// Build a key from raw bytes as the store returns them
    ///
    /// The string form is derived when the bytes are displayable text.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let text = std::str::from_utf8(&bytes)
            .ok()
            .filter(|s| is_displayable(s))
            .map(str::to_string);
        Self { bytes, text }
    }

    /// Canonical byte encoding of the key
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Owned copy of the canonical bytes
    #[must_use]
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Lowercase hex form, derived from the canonical bytes
    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// String form, if the key has one
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether the string form is the one to display and edit
    #[must_use]
    pub const fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

/// Text is displayable when it contains only graphic characters and whitespace
///
/// Control, format, private-use, surrogate and unassigned code points are not
/// graphic, so zero-width and bidi marks make the text undisplayable.
pub(crate) fn is_displayable(text: &str) -> bool {
    text.chars().all(|c| {
        c.is_whitespace()
            || !matches!(
                get_general_category(c),
                GeneralCategory::Control
                    | GeneralCategory::Format
                    | GeneralCategory::PrivateUse
                    | GeneralCategory::Surrogate
                    | GeneralCategory::Unassigned
            )
    })
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "Key({text:?}, 0x{})", self.hex()),
            None => write!(f, "Key(0x{})", self.hex()),
        }
    }
}

/// Renders the key the way it appears in a path expression
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::path::write_element(f, self)
    }
}

/// Wire representation of a key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
    #[serde(default, rename = "str", skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl TryFrom<KeyRepr> for Key {
    type Error = KeyError;

    fn try_from(repr: KeyRepr) -> Result<Self, Self::Error> {
        match (repr.text, repr.hex) {
            (Some(text), Some(hex_text)) => {
                let key = Self::from_hex(&hex_text)?;
                if key.bytes != text.as_bytes() {
                    return Err(KeyError::MalformedKey(format!(
                        "{hex_text}: does not encode {text:?}"
                    )));
                }
                Ok(Self::from_text(text))
            }
            (Some(text), None) => Ok(Self::from_text(text)),
            (None, Some(hex_text)) => Self::from_hex(&hex_text),
            (None, None) => Err(KeyError::Empty),
        }
    }
}

impl From<Key> for KeyRepr {
    fn from(key: Key) -> Self {
        Self {
            hex: Some(key.hex()),
            text: key.text,
        }
    }
}
