//! Key paths and their textual expression form
//!
//! A [`KeyPath`] is the ordered list of keys leading from the store root to a
//! nested bucket; the root itself is the empty path. Together with an optional
//! terminal key it addresses either a bucket or a single value.
//!
//! The expression form is what users read and type:
//!
//! ```text
//! "users" / 0x00ff / "alice" - "email"
//! ```
//!
//! - string keys are quoted, raw keys are `0x` followed by hex digits
//! - ` / ` separates bucket levels
//! - ` - ` introduces the value key, at most once and always last
//!
//! [`marshal`] and [`unmarshal`] are exact inverses for everything `marshal`
//! produces.

mod error;
mod parser;

pub use error::{ParseFailure, PathError};

use crate::key::Key;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Separator between bucket levels
pub const BUCKET_SEPARATOR: &str = " / ";

/// Separator before the value key
pub const VALUE_SEPARATOR: &str = " - ";

/// Ordered keys from the root to a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<Key>);

impl KeyPath {
    /// The store root
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn push(&mut self, key: Key) {
        self.0.push(key);
    }

    /// This path extended by one key
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        let mut keys = self.0.clone();
        keys.push(key);
        Self(keys)
    }

    /// The first `len` keys of this path
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Every prefix from the root up to and including this path
    pub fn prefixes(&self) -> impl Iterator<Item = Self> + '_ {
        (0..=self.0.len()).map(|len| self.prefix(len))
    }

    /// Whether `self` is `other` or an ancestor of it
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Hex forms of every key joined with `/`, as used in URLs and routes
    #[must_use]
    pub fn hex_joined(&self) -> String {
        self.0.iter().map(Key::hex).collect::<Vec<_>>().join("/")
    }
}

impl From<Vec<Key>> for KeyPath {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl FromIterator<Key> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&marshal(self, None))
    }
}

/// Write a single key in expression form
///
/// Keys whose string form contains a double quote are written as hex, since
/// quoted strings have no escape sequences.
pub(crate) fn write_element<W: fmt::Write>(out: &mut W, key: &Key) -> fmt::Result {
    match key.text() {
        Some(text) if !text.contains('"') => write!(out, "\"{text}\""),
        _ => write!(out, "0x{}", key.hex()),
    }
}

/// Render a path and optional value key as an expression
///
/// # Examples
///
/// ```
/// use bucketview::key::Key;
/// use bucketview::path::{marshal, KeyPath};
///
/// let path = KeyPath::from(vec![Key::from_text("a"), Key::from_hex("ff").unwrap()]);
/// let value = Key::from_text("x");
/// assert_eq!(marshal(&path, Some(&value)), r#""a" / 0xff - "x""#);
/// assert_eq!(marshal(&KeyPath::root(), None), "");
/// ```
#[must_use]
pub fn marshal(path: &KeyPath, value: Option<&Key>) -> String {
    let mut out = String::new();
    for (i, key) in path.keys().iter().enumerate() {
        if i > 0 {
            out.push_str(BUCKET_SEPARATOR);
        }
        // Writing into a String cannot fail
        let _ = write_element(&mut out, key);
    }
    if let Some(value) = value {
        out.push_str(VALUE_SEPARATOR);
        let _ = write!(out, "{value}");
    }
    out
}

/// Parse an expression into a path and optional value key
///
/// The empty string is the root with no value.
///
/// # Errors
///
/// Returns `PathError::InvalidExpression` describing the first offending
/// position; see [`ParseFailure`] for the possible reasons.
pub fn unmarshal(expression: &str) -> Result<(KeyPath, Option<Key>), PathError> {
    parser::parse(expression)
}
