//! Bucketview - browse nested-bucket key-value stores through paged views
//!
//! This library provides the engine behind a multi-level store browser:
//! keys and path expressions, per-level pagination windows that grow in both
//! directions, and a session that links the levels together. The engine
//! performs no I/O; pages are fetched through the [`api::BrowseApi`] trait,
//! which the embedded sled store in [`db`] implements.

use thiserror::Error;

pub mod api;
pub mod browse;
pub mod cli;
pub mod config;
pub mod db;
pub mod display;
pub mod key;
pub mod models;
pub mod output;
pub mod path;
pub mod window;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Database error
    #[error("Database error: {0}")]
    DbError(#[from] db::DbError),
    /// A page could not be fetched
    #[error("{0}")]
    FetchError(#[from] api::FetchError),
    /// A path expression did not parse
    #[error("{0}")]
    PathError(#[from] path::PathError),
    /// A key was malformed
    #[error("{0}")]
    KeyError(#[from] key::KeyError),
    /// Browse session error
    #[error("Browse error: {0}")]
    BrowseError(#[from] browse::BrowseError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
