//! Database wrapper module for bucketview
//!
//! Provides a nested-bucket key-value store using sled as the embedded
//! database backend.
//!
//! Every bucket is its own sled tree, named after the hex form of its path:
//! - `bucket:` is the root
//! - `bucket:61/` is the bucket `"a"`
//! - `bucket:61/ff/` is the bucket `"a" / 0xff`
//!
//! Inside a tree the raw key bytes map to a bincode-encoded record that is
//! either a bucket marker or the value bytes of a leaf. sled keeps keys in
//! byte-lexicographic order, which is exactly the order pages are served in.

use crate::api::{BrowseApi, BrowseQuery, Cursor, FetchError};
use crate::key::Key;
use crate::models::{Entry, Tree, Value};
use crate::path::KeyPath;
use bincode::{Decode, Encode};
use sled::{Db, IVec};
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

pub mod error;

pub use error::DbError;

/// Entries returned per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

const TREE_PREFIX: &str = "bucket:";

/// On-disk form of one entry
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
enum StoredEntry {
    Bucket,
    Leaf(Vec<u8>),
}

fn tree_name(path: &KeyPath) -> String {
    let mut name = String::from(TREE_PREFIX);
    for key in path {
        name.push_str(&key.hex());
        name.push('/');
    }
    name
}

fn decode_record(bytes: &[u8]) -> Result<StoredEntry, DbError> {
    let (record, _): (StoredEntry, usize) =
        bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(record)
}

fn read_record(tree: &sled::Tree, key: &Key) -> Result<Option<StoredEntry>, DbError> {
    tree.get(key.as_bytes())?
        .map(|bytes| decode_record(&bytes))
        .transpose()
}

fn write_record(tree: &sled::Tree, key: &Key, record: &StoredEntry) -> Result<(), DbError> {
    let bytes = bincode::encode_to_vec(record, bincode::config::standard())?;
    tree.insert(key.as_bytes(), bytes)?;
    Ok(())
}

fn to_entry(key: Key, record: StoredEntry) -> Entry {
    match record {
        StoredEntry::Bucket => Entry::bucket(key),
        StoredEntry::Leaf(bytes) => Entry::leaf(key, Value::from_bytes(bytes)),
    }
}

/// Database wrapper that encapsulates all store operations
pub struct Database {
    db: Db,
    page_size: usize,
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use bucketview::db::Database;
    /// let db = Database::open("my_db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let db = sled::open(path)?;
        Ok(Self {
            db,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Serve pages of `page_size` entries instead of the default
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    fn root(&self) -> Result<sled::Tree, DbError> {
        Ok(self.db.open_tree(tree_name(&KeyPath::root()))?)
    }

    /// Check whether `path` names an existing bucket
    ///
    /// The root always exists.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if database operations fail.
    pub fn bucket_exists(&self, path: &KeyPath) -> Result<bool, DbError> {
        let mut tree = self.root()?;
        for (depth, key) in path.keys().iter().enumerate() {
            match read_record(&tree, key)? {
                Some(StoredEntry::Bucket) => {
                    tree = self.db.open_tree(tree_name(&path.prefix(depth + 1)))?;
                }
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn bucket(&self, path: &KeyPath) -> Result<sled::Tree, DbError> {
        if !self.bucket_exists(path)? {
            return Err(DbError::BucketNotFound(path.to_string()));
        }
        Ok(self.db.open_tree(tree_name(path))?)
    }

    /// Create the bucket at `path` along with any missing parents
    ///
    /// Creating a bucket that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotABucket` if a key on the path holds a value, and
    /// `DbError::InvalidInput` if a key on the path is empty.
    pub fn create_bucket(&self, path: &KeyPath) -> Result<(), DbError> {
        if let Some(depth) = path.keys().iter().position(|k| k.as_bytes().is_empty()) {
            return Err(DbError::InvalidInput(format!(
                "empty key in {}",
                path.prefix(depth + 1)
            )));
        }
        let mut tree = self.root()?;
        for (depth, key) in path.keys().iter().enumerate() {
            let prefix = path.prefix(depth + 1);
            match read_record(&tree, key)? {
                Some(StoredEntry::Leaf(_)) => return Err(DbError::NotABucket(prefix.to_string())),
                Some(StoredEntry::Bucket) => {}
                None => {
                    write_record(&tree, key, &StoredEntry::Bucket)?;
                    debug!(path = %prefix, "bucket created");
                }
            }
            tree = self.db.open_tree(tree_name(&prefix))?;
        }
        Ok(())
    }

    /// Insert or replace the value `key` in the bucket at `path`
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` for the root (which holds only buckets),
    /// for an empty key or when `key` is a bucket, and
    /// `DbError::BucketNotFound` if the bucket does not exist.
    pub fn put(&self, path: &KeyPath, key: &Key, value: impl Into<Vec<u8>>) -> Result<(), DbError> {
        if path.is_root() {
            return Err(DbError::InvalidInput("the root holds only buckets".into()));
        }
        if key.as_bytes().is_empty() {
            return Err(DbError::InvalidInput("key required".into()));
        }
        let tree = self.bucket(path)?;
        if read_record(&tree, key)? == Some(StoredEntry::Bucket) {
            return Err(DbError::InvalidInput(format!(
                "{} is a bucket",
                path.child(key.clone())
            )));
        }
        write_record(&tree, key, &StoredEntry::Leaf(value.into()))
    }

    /// Get the entry `key` of the bucket at `path`
    ///
    /// # Returns
    /// * `Some(Entry)` if the key exists
    /// * `None` if it does not
    ///
    /// # Errors
    ///
    /// Returns `DbError::BucketNotFound` if the bucket does not exist.
    pub fn get(&self, path: &KeyPath, key: &Key) -> Result<Option<Entry>, DbError> {
        let tree = self.bucket(path)?;
        Ok(read_record(&tree, key)?.map(|record| to_entry(key.clone(), record)))
    }

    /// Remove the entry `key` from the bucket at `path`
    ///
    /// Removing a bucket removes everything nested below it.
    ///
    /// # Returns
    /// `true` if the entry existed
    ///
    /// # Errors
    ///
    /// Returns `DbError::BucketNotFound` if the bucket does not exist.
    pub fn delete(&self, path: &KeyPath, key: &Key) -> Result<bool, DbError> {
        let tree = self.bucket(path)?;
        let Some(removed) = tree.remove(key.as_bytes())? else {
            return Ok(false);
        };
        if decode_record(&removed)? == StoredEntry::Bucket {
            self.drop_subtree(&path.child(key.clone()))?;
        }
        Ok(true)
    }

    fn drop_subtree(&self, path: &KeyPath) -> Result<(), DbError> {
        let name = tree_name(path);
        let tree = self.db.open_tree(&name)?;
        for item in &tree {
            let (key, value) = item?;
            if decode_record(&value)? == StoredEntry::Bucket {
                self.drop_subtree(&path.child(Key::from_bytes(key.to_vec())))?;
            }
        }
        self.db.drop_tree(name)?;
        debug!(%path, "bucket dropped");
        Ok(())
    }

    /// Read one page of the bucket at `path`
    ///
    /// Without a cursor the page starts at the first entry. `From` includes the
    /// cursor key, `After` and `Before` exclude it. Pages are always in
    /// ascending key order.
    ///
    /// # Errors
    ///
    /// Returns `DbError::BucketNotFound` if the bucket does not exist, or
    /// `DbError` if reading or decoding fails.
    pub fn browse(&self, path: &KeyPath, cursor: Option<&Cursor>) -> Result<Tree, DbError> {
        let tree = self.bucket(path)?;
        let page = self.page_size;

        let records: Vec<(IVec, IVec)> = match cursor {
            None => tree.iter().take(page).collect::<Result<_, _>>()?,
            Some(Cursor::From(key)) => tree
                .range(key.as_bytes()..)
                .take(page)
                .collect::<Result<_, _>>()?,
            Some(Cursor::After(key)) => tree
                .range::<&[u8], _>((Bound::Excluded(key.as_bytes()), Bound::Unbounded))
                .take(page)
                .collect::<Result<_, _>>()?,
            Some(Cursor::Before(key)) => {
                let mut records: Vec<(IVec, IVec)> = tree
                    .range(..key.as_bytes())
                    .rev()
                    .take(page)
                    .collect::<Result<_, _>>()?;
                records.reverse();
                records
            }
        };

        let entries = records
            .iter()
            .map(|(key, value)| Ok(to_entry(Key::from_bytes(key.to_vec()), decode_record(value)?)))
            .collect::<Result<Vec<_>, DbError>>()?;

        debug!(%path, cursor = cursor.map(Cursor::name), entries = entries.len(), "page read");
        Ok(Tree {
            path: path.clone(),
            entries,
        })
    }

    /// Flush the database to disk
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }
}

impl BrowseApi for Database {
    fn browse(&self, query: &BrowseQuery) -> Result<Tree, FetchError> {
        Self::browse(self, &query.path, query.cursor.as_ref()).map_err(|e| match e {
            DbError::BucketNotFound(path) => FetchError::BucketNotFound(path),
            other => FetchError::Store(other),
        })
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Best-effort flush on drop. Callers should explicitly flush()
        // if they need guaranteed durability.
        let _ = self.db.flush();
    }
}
