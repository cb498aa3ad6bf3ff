//! Testing utilities for bucketview
//!
//! This module provides helper types for writing tests: a `ScriptedApi`
//! answering browse queries from memory, and a `TestDb` wrapper for a
//! temporary on-disk store.
//!
//! Only available when compiled with `cfg(test)`.

use crate::api::{BrowseApi, BrowseQuery, Cursor, FetchError};
use crate::db::Database;
use crate::key::Key;
use crate::models::{Entry, Tree, Value};
use crate::path::KeyPath;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use tempfile::TempDir;

/// In-memory `BrowseApi` with the same paging rules as the store
///
/// Every query is recorded, and the next `n` queries can be made to fail.
///
/// # Examples
/// ```ignore
/// let api = ScriptedApi::new(2).with_leaves(&KeyPath::root(), 0..5);
/// let tree = api.browse(&BrowseQuery::default()).unwrap();
/// assert_eq!(tree.entries.len(), 2);
/// ```
pub struct ScriptedApi {
    page_size: usize,
    buckets: HashMap<KeyPath, BTreeMap<Key, Entry>>,
    failures: Cell<usize>,
    calls: RefCell<Vec<BrowseQuery>>,
}

impl ScriptedApi {
    /// Create an API holding only an empty root
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(KeyPath::root(), BTreeMap::new());
        Self {
            page_size,
            buckets,
            failures: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Add a bucket (and its parents) under `path`
    #[must_use]
    pub fn with_bucket(mut self, path: &KeyPath) -> Self {
        for depth in 1..=path.len() {
            let parent = path.prefix(depth - 1);
            let key = path.keys()[depth - 1].clone();
            self.buckets
                .entry(parent)
                .or_default()
                .insert(key.clone(), Entry::bucket(key));
            self.buckets.entry(path.prefix(depth)).or_default();
        }
        self
    }

    /// Add leaves with single-byte keys `n` and values `[n]` to `path`
    #[must_use]
    pub fn with_leaves(mut self, path: &KeyPath, keys: std::ops::Range<u8>) -> Self {
        self = self.with_bucket(path);
        let bucket = self.buckets.entry(path.clone()).or_default();
        for n in keys {
            let key = byte_key(n);
            bucket.insert(key.clone(), Entry::leaf(key, Value::from_bytes(vec![n])));
        }
        self
    }

    /// Remove a key from the bucket at `path`
    pub fn remove(&mut self, path: &KeyPath, key: &Key) {
        if let Some(bucket) = self.buckets.get_mut(path) {
            bucket.remove(key);
        }
    }

    /// Make the next `count` queries fail
    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }

    /// Every query answered so far
    #[must_use]
    pub fn calls(&self) -> Vec<BrowseQuery> {
        self.calls.borrow().clone()
    }
}

impl BrowseApi for ScriptedApi {
    fn browse(&self, query: &BrowseQuery) -> Result<Tree, FetchError> {
        self.calls.borrow_mut().push(query.clone());
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(FetchError::Backend("scripted failure".into()));
        }

        let bucket = self
            .buckets
            .get(&query.path)
            .ok_or_else(|| FetchError::BucketNotFound(query.path.to_string()))?;

        let entries: Vec<Entry> = match &query.cursor {
            None => bucket.values().take(self.page_size).cloned().collect(),
            Some(Cursor::From(key)) => bucket
                .range(key.clone()..)
                .map(|(_, e)| e.clone())
                .take(self.page_size)
                .collect(),
            Some(Cursor::After(key)) => bucket
                .range(key.clone()..)
                .map(|(_, e)| e.clone())
                .filter(|e| &e.key > key)
                .take(self.page_size)
                .collect(),
            Some(Cursor::Before(key)) => {
                let mut page: Vec<Entry> = bucket
                    .range(..key.clone())
                    .rev()
                    .map(|(_, e)| e.clone())
                    .take(self.page_size)
                    .collect();
                page.reverse();
                page
            }
        };

        Ok(Tree {
            path: query.path.clone(),
            entries,
        })
    }
}

/// Key consisting of the single byte `n`
#[must_use]
pub fn byte_key(n: u8) -> Key {
    Key::from_bytes(vec![n])
}

/// Wrapper for a temporary test database that cleans up on drop
///
/// The store lives in a fresh `tempfile` directory, so parallel tests never
/// share state.
pub struct TestDb {
    _dir: TempDir,
    db: Database,
}

impl TestDb {
    /// Create a new, empty test database
    ///
    /// # Panics
    /// Panics if the temporary directory or the database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(dir.path().join("store")).expect("Failed to open test database");
        Self { _dir: dir, db }
    }

    /// Get a reference to the underlying database
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(tree: &Tree) -> Vec<u8> {
        tree.entries.iter().map(|e| e.key.as_bytes()[0]).collect()
    }

    #[test]
    fn test_scripted_paging() {
        let api = ScriptedApi::new(3).with_leaves(&KeyPath::root(), 0..10);
        let first = api.browse(&BrowseQuery::default()).unwrap();
        assert_eq!(bytes(&first), vec![0, 1, 2]);

        let after = BrowseQuery::new(KeyPath::root(), Some(Cursor::After(byte_key(2))));
        assert_eq!(bytes(&api.browse(&after).unwrap()), vec![3, 4, 5]);

        let before = BrowseQuery::new(KeyPath::root(), Some(Cursor::Before(byte_key(7))));
        assert_eq!(bytes(&api.browse(&before).unwrap()), vec![4, 5, 6]);

        let from = BrowseQuery::new(KeyPath::root(), Some(Cursor::From(byte_key(8))));
        assert_eq!(bytes(&api.browse(&from).unwrap()), vec![8, 9]);
        assert_eq!(api.calls().len(), 4);
    }

    #[test]
    fn test_scripted_failures() {
        let api = ScriptedApi::new(3);
        api.fail_next(1);
        assert!(api.browse(&BrowseQuery::default()).is_err());
        assert!(api.browse(&BrowseQuery::default()).is_ok());
    }

    #[test]
    fn test_db_starts_empty() {
        let test_db = TestDb::new();
        let root = test_db.db().browse(&KeyPath::root(), None).unwrap();
        assert!(root.entries.is_empty());
    }
}
