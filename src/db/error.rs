//! Database-specific error types
//!
//! This module defines all error types that can occur during store operations.
//!
//! # Error Types
//!
//! - **`SledError`**: Errors from the underlying sled embedded database
//! - **`DecodeError`**: Failures when deserializing an entry record
//! - **`EncodeError`**: Failures when serializing an entry record
//! - **`BucketNotFound`**: A path names a bucket that does not exist
//! - **`NotABucket`**: A path runs through a leaf
//! - **`InvalidInput`**: The operation makes no sense for its arguments
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use thiserror::Error;

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// The bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// A key on the path holds a value, not a bucket
    #[error("Not a bucket: {0}")]
    NotABucket(String),

    /// Invalid input provided (e.g., a value at the root)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
