#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # confed-store
//!
//! File-backed persistence for named documents.
//!
//! Each document `X` is a pair of files in the store directory:
//!
//! - `X.json`: the data, created once with a default instance and never
//!   overwritten by later opens
//! - `X.definition.json`: the schema, regenerated from the current type
//!   descriptors on every [`DocumentStore::generate`]
//!
//! All file access goes through `tokio::fs`.

/// Store configuration.
pub mod config;
/// Document store operations.
pub mod store;

pub use config::StoreConfig;
pub use store::DocumentStore;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing documents
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema file not found: {}", path.display())]
    MissingSchema { path: PathBuf },

    #[error("Malformed document {}: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] confed_schema::Error),
}

impl Error {
    /// Build a malformed-document error for the file at `path`.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
