use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::storage::client::{ContentToken, FileStore, StoreError, StoredFile};

const API_VERSION: &str = "2022-11-28";

/// [`FileStore`] backed by the GitHub repository contents API.
///
/// Each write or delete is one commit on the configured branch. The blob SHA
/// returned by GitHub is used as the concurrency token.
pub struct GitHubFileStore {
    http: reqwest::Client,
    config: GitHubConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<serde::de::IgnoredAny>),
    Entry(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

impl GitHubFileStore {
    /// Build a client for the configured repository.
    ///
    /// The underlying HTTP client (and its connection pool) is shared by all
    /// requests made through this store.
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| StoreError::Unauthorized("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("folio-cms"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), encode_path(path))
    }

    async fn fetch_blob(&self, path: &str, sha: &str) -> Result<Vec<u8>, StoreError> {
        let url = format!("{}/git/blobs/{}", self.repo_url(), sha);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        let blob: BlobResponse = response.json().await.map_err(decode)?;
        if blob.encoding != "base64" {
            return Err(StoreError::Decode(format!(
                "unsupported blob encoding '{}'",
                blob.encoding
            )));
        }
        decode_base64(&blob.content)
    }
}

/// Percent-encode each segment of a repository path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// GitHub wraps base64 payloads at 60 columns.
fn decode_base64(content: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("invalid base64 content: {e}")))
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

async fn error_from_response(path: &str, response: Response) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: path.to_string(),
        },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict {
            path: path.to_string(),
            message,
        },
        _ => StoreError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl FileStore for GitHubFileStore {
    async fn read_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let response = self
            .http
            .get(self.contents_url(path))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }

        let entry = match response.json::<ContentsResponse>().await.map_err(decode)? {
            ContentsResponse::Directory(entries) => {
                tracing::debug!(path, entries = entries.len(), "contents path is a directory");
                return Err(StoreError::NotAFile {
                    path: path.to_string(),
                })
            }
            ContentsResponse::Entry(entry) if entry.kind != "file" => {
                return Err(StoreError::NotAFile {
                    path: path.to_string(),
                })
            }
            ContentsResponse::Entry(entry) => entry,
        };

        let content = match (entry.encoding.as_deref(), entry.content.as_deref()) {
            (Some("base64"), Some(content)) => decode_base64(content)?,
            // Files over 1 MB come back without inline content.
            _ => self.fetch_blob(path, &entry.sha).await?,
        };

        tracing::debug!(path, sha = %entry.sha, "read file from GitHub");
        Ok(Some(StoredFile {
            content,
            token: ContentToken::new(entry.sha),
        }))
    }

    async fn write_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        expected: Option<ContentToken>,
    ) -> Result<ContentToken, StoreError> {
        let body = WriteRequest {
            message,
            content: STANDARD.encode(&content),
            branch: &self.config.branch,
            sha: expected.as_ref().map(ContentToken::as_str),
        };

        let response = self
            .http
            .put(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }

        let written: WriteResponse = response.json().await.map_err(decode)?;
        tracing::info!(path, sha = %written.content.sha, "committed file to GitHub");
        Ok(ContentToken::new(written.content.sha))
    }

    async fn delete_file(
        &self,
        path: &str,
        expected: ContentToken,
        message: &str,
    ) -> Result<(), StoreError> {
        let body = DeleteRequest {
            message,
            sha: expected.as_str(),
            branch: &self.config.branch,
        };

        let response = self
            .http
            .delete(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }

        tracing::info!(path, "deleted file from GitHub");
        Ok(())
    }
}
