use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque concurrency token describing a file's state at the time it was read.
///
/// For the GitHub backend this is the blob SHA of the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentToken(String);

impl ContentToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file read from the store together with the token required to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub token: ContentToken,
}

impl StoredFile {
    pub fn text(&self) -> Result<&str, StoreError> {
        std::str::from_utf8(&self.content)
            .map_err(|e| StoreError::Decode(format!("file is not valid UTF-8: {e}")))
    }
}

/// Errors raised by a [`FileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{path}' does not exist")]
    NotFound { path: String },

    #[error("'{path}' is not a file")]
    NotAFile { path: String },

    /// The expected token did not match the file's current state.
    #[error("concurrent modification of '{path}': {message}")]
    Conflict { path: String, message: String },

    #[error("store rejected credentials: {0}")]
    Unauthorized(String),

    #[error("store returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("store request failed: {0}")]
    Transport(String),

    #[error("invalid store response: {0}")]
    Decode(String),
}

/// Remote file store with compare-and-swap writes.
///
/// Every mutation names the token it expects the path to currently carry:
/// `None` means the path must not exist yet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read a file. Returns `None` if nothing exists at `path`.
    async fn read_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Create or replace a file in a single commit and return its new token.
    async fn write_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        expected: Option<ContentToken>,
    ) -> Result<ContentToken, StoreError>;

    /// Delete a file in a single commit.
    async fn delete_file(
        &self,
        path: &str,
        expected: ContentToken,
        message: &str,
    ) -> Result<(), StoreError>;
}
