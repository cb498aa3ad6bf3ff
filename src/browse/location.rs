//! Navigable locations
//!
//! A location is what a host puts in its address bar or history: the bucket
//! path and the selected value key. Routes use hex so any key survives:
//!
//! ```text
//! /                       root, nothing selected
//! /61/ff                  bucket "a" / 0xff
//! /61/ff?value=78         value "x" inside it
//! ```

use crate::api::parse_hex_segments;
use crate::key::{Key, KeyError};
use crate::path::{self, KeyPath, PathError};
use std::fmt;

/// A bucket path plus an optional selected value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: KeyPath,
    pub value: Option<Key>,
}

impl Location {
    #[must_use]
    pub const fn new(path: KeyPath, value: Option<Key>) -> Self {
        Self { path, value }
    }

    /// Route string for the host's router
    #[must_use]
    pub fn to_route(&self) -> String {
        let mut route = format!("/{}", self.path.hex_joined());
        if let Some(value) = &self.value {
            route.push_str(&format!("?value={}", value.hex()));
        }
        route
    }

    /// Parse a route produced by [`Location::to_route`]
    ///
    /// # Errors
    ///
    /// Returns `KeyError::MalformedKey` if a path segment or the value is not
    /// valid hex.
    pub fn from_route(route: &str) -> Result<Self, KeyError> {
        let (route, query) = route.split_once('?').unwrap_or((route, ""));
        let path = parse_hex_segments(route)?;
        let value = query
            .split('&')
            .filter_map(|pair| pair.strip_prefix("value="))
            .find(|v| !v.is_empty())
            .map(|v| Key::from_hex(v).map(|k| Key::from_bytes(k.to_canonical_bytes())))
            .transpose()?;
        Ok(Self { path, value })
    }

    /// Editable expression text for this location
    #[must_use]
    pub fn to_expression(&self) -> String {
        path::marshal(&self.path, self.value.as_ref())
    }

    /// Parse editable expression text
    ///
    /// # Errors
    ///
    /// Returns `PathError::InvalidExpression` if the text does not parse.
    pub fn from_expression(expression: &str) -> Result<Self, PathError> {
        let (path, value) = path::unmarshal(expression)?;
        Ok(Self { path, value })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}
