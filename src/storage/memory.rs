use std::collections::BTreeMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::storage::client::{ContentToken, FileStore, StoreError, StoredFile};

/// A commit recorded by [`MemoryFileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub path: String,
    pub message: String,
    pub deleted: bool,
}

#[derive(Default)]
struct Inner {
    files: BTreeMap<String, StoredFile>,
    commits: Vec<Commit>,
}

/// In-process [`FileStore`] with the same compare-and-swap rules as the
/// GitHub backend. Used for local development and tests.
#[derive(Default)]
pub struct MemoryFileStore {
    inner: RwLock<Inner>,
}

fn token_for(path: &str, content: &[u8]) -> ContentToken {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(content);
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    ContentToken::new(hex)
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a file in the store without recording a commit.
    pub async fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> ContentToken {
        let content = content.into();
        let token = token_for(path, &content);
        self.inner.write().await.files.insert(
            path.to_string(),
            StoredFile {
                content,
                token: token.clone(),
            },
        );
        token
    }

    /// Current content of `path`, if any.
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .read()
            .await
            .files
            .get(path)
            .map(|f| f.content.clone())
    }

    pub async fn paths(&self) -> Vec<String> {
        self.inner.read().await.files.keys().cloned().collect()
    }

    pub async fn commits(&self) -> Vec<Commit> {
        self.inner.read().await.commits.clone()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let inner = self.inner.read().await;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        if !inner.files.contains_key(path) && inner.files.keys().any(|k| k.starts_with(&prefix)) {
            return Err(StoreError::NotAFile {
                path: path.to_string(),
            });
        }
        Ok(inner.files.get(path).cloned())
    }

    async fn write_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        expected: Option<ContentToken>,
    ) -> Result<ContentToken, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.files.get(path).map(|f| f.token.clone());

        match (current, expected) {
            (Some(_), None) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "file already exists and no token was supplied".into(),
                })
            }
            (None, Some(_)) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "file no longer exists".into(),
                })
            }
            (Some(current), Some(expected)) if current != expected => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: format!("expected token {expected}, found {current}"),
                })
            }
            _ => {}
        }

        let token = token_for(path, &content);
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content,
                token: token.clone(),
            },
        );
        inner.commits.push(Commit {
            path: path.to_string(),
            message: message.to_string(),
            deleted: false,
        });
        Ok(token)
    }

    async fn delete_file(
        &self,
        path: &str,
        expected: ContentToken,
        message: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner
            .files
            .get(path)
            .map(|f| f.token.clone())
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })?;

        if current != expected {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                message: format!("expected token {expected}, found {current}"),
            });
        }

        inner.files.remove(path);
        inner.commits.push(Commit {
            path: path.to_string(),
            message: message.to_string(),
            deleted: true,
        });
        Ok(())
    }
}
