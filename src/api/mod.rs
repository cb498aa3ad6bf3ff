//! Browse API: the query a window sends and the collaborator that answers it
//!
//! Every page is requested with `GET {prefix}browse/{hex}/{hex}/...` and at
//! most one cursor parameter:
//!
//! | Cursor       | Query          | Meaning                               |
//! |--------------|----------------|---------------------------------------|
//! | none         |                | first page of the bucket              |
//! | `From(k)`    | `?from=<hex>`  | page starting at `k` (inclusive)      |
//! | `After(k)`   | `?after=<hex>` | page strictly after `k`               |
//! | `Before(k)`  | `?before=<hex>`| page strictly before `k`, ascending   |
//!
//! [`BrowseApi`] is the seam the engine fetches through. The local store in
//! [`crate::db`] implements it directly; a remote host implements it over
//! HTTP. [`Browser`] drives a session against any implementation.

mod driver;

pub use driver::Browser;

use crate::db::DbError;
use crate::key::{Key, KeyError};
use crate::models::Tree;
use crate::path::KeyPath;
use thiserror::Error;

/// Errors produced while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport or backend failure reported by the collaborator
    #[error("Fetch failed: {0}")]
    Backend(String),

    /// The bucket named by the query does not exist
    #[error("Fetch failed: bucket not found: {0}")]
    BucketNotFound(String),

    /// The query could not be understood
    #[error("Fetch failed: invalid query: {0}")]
    InvalidQuery(String),

    /// Local store failure
    #[error("Fetch failed: {0}")]
    Store(#[from] DbError),
}

impl From<KeyError> for FetchError {
    fn from(e: KeyError) -> Self {
        Self::InvalidQuery(e.to_string())
    }
}

/// Boundary a page is requested relative to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    Before(Key),
    After(Key),
    From(Key),
}

impl Cursor {
    /// Query parameter name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Before(_) => "before",
            Self::After(_) => "after",
            Self::From(_) => "from",
        }
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        match self {
            Self::Before(key) | Self::After(key) | Self::From(key) => key,
        }
    }
}

/// One page request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrowseQuery {
    pub path: KeyPath,
    pub cursor: Option<Cursor>,
}

impl BrowseQuery {
    #[must_use]
    pub const fn new(path: KeyPath, cursor: Option<Cursor>) -> Self {
        Self { path, cursor }
    }

    /// Request URL relative to an API prefix such as `/api/`
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketview::api::{BrowseQuery, Cursor};
    /// use bucketview::key::Key;
    /// use bucketview::path::KeyPath;
    ///
    /// let path = KeyPath::from(vec![Key::from_text("a"), Key::from_hex("ff").unwrap()]);
    /// let query = BrowseQuery::new(path, Some(Cursor::After(Key::from_text("x"))));
    /// assert_eq!(query.url("/api/"), "/api/browse/61/ff?after=78");
    /// assert_eq!(BrowseQuery::default().url("/api/"), "/api/browse/");
    /// ```
    #[must_use]
    pub fn url(&self, prefix: &str) -> String {
        let mut url = format!("{prefix}browse/{}", self.path.hex_joined());
        if let Some(cursor) = &self.cursor {
            url.push_str(&format!("?{}={}", cursor.name(), cursor.key().hex()));
        }
        url
    }

    /// Parse the part of a request URL after the API prefix
    ///
    /// Accepts `browse/<hex>/...` optionally followed by a query string. Keys
    /// get their string form back when their bytes are displayable.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidQuery` if the URL does not start with
    /// `browse`, a segment or cursor is not valid hex, an unknown parameter is
    /// present, or more than one cursor is given.
    pub fn parse_url(url: &str) -> Result<Self, FetchError> {
        let (route, query) = url.split_once('?').unwrap_or((url, ""));
        let route = route.trim_start_matches('/');
        let rest = route
            .strip_prefix("browse")
            .ok_or_else(|| FetchError::InvalidQuery(format!("not a browse url: {url}")))?;

        let path = parse_hex_segments(rest)?;

        let mut cursor = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if value.is_empty() {
                continue;
            }
            let key = Key::from_bytes(Key::from_hex(value)?.to_canonical_bytes());
            let parsed = match name {
                "before" => Cursor::Before(key),
                "after" => Cursor::After(key),
                "from" => Cursor::From(key),
                other => {
                    return Err(FetchError::InvalidQuery(format!("unknown parameter: {other}")));
                }
            };
            if cursor.replace(parsed).is_some() {
                return Err(FetchError::InvalidQuery(
                    "passed two or more of before/after/from at the same time".into(),
                ));
            }
        }

        Ok(Self { path, cursor })
    }
}

impl Default for BrowseQuery {
    fn default() -> Self {
        Self::new(KeyPath::root(), None)
    }
}

/// Parse `/`-separated hex segments into a path, ignoring empty segments
pub(crate) fn parse_hex_segments(segments: &str) -> Result<KeyPath, KeyError> {
    segments
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| Key::from_hex(s).map(|k| Key::from_bytes(k.to_canonical_bytes())))
        .collect()
}

/// Source of pages for the pagination engine
pub trait BrowseApi {
    /// Fetch one page of `query.path` relative to `query.cursor`
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the page cannot be produced.
    fn browse(&self, query: &BrowseQuery) -> Result<Tree, FetchError>;
}

impl<T: BrowseApi + ?Sized> BrowseApi for &T {
    fn browse(&self, query: &BrowseQuery) -> Result<Tree, FetchError> {
        (**self).browse(query)
    }
}
