use std::fmt;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_OWNER: &str = "jimmyeliasson";
pub const DEFAULT_REPO: &str = "jimmyeliasson.dev";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Which [`FileStore`](crate::storage::client::FileStore) backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Github,
    Memory,
}

/// Process settings, merged from defaults, an optional `folio.toml` and the
/// environment. Keys match the lower-cased environment variable names.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub github_token: Option<String>,
    pub github_owner: String,
    pub github_repo: String,
    pub github_branch: String,
    pub github_api_url: String,
    #[serde(rename = "folio_bind_addr")]
    pub bind_addr: String,
    #[serde(rename = "folio_store")]
    pub store: StoreBackend,
    #[serde(rename = "folio_content_root")]
    pub content_root: String,
    #[serde(rename = "folio_asset_dir")]
    pub asset_dir: String,
    #[serde(rename = "folio_asset_public_prefix")]
    pub asset_public_prefix: String,
    #[serde(rename = "folio_placeholder_cover")]
    pub placeholder_cover: String,
    #[serde(default, rename = "folio_admin_token")]
    pub admin_token: Option<String>,
    #[serde(rename = "folio_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Settings {
    /// A builder pre-loaded with every default value.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("github_owner", DEFAULT_OWNER)?
            .set_default("github_repo", DEFAULT_REPO)?
            .set_default("github_branch", DEFAULT_BRANCH)?
            .set_default("github_api_url", DEFAULT_API_URL)?
            .set_default("folio_bind_addr", "0.0.0.0:3000")?
            .set_default("folio_store", "github")?
            .set_default("folio_content_root", "src/content")?
            .set_default("folio_asset_dir", "public/images/covers")?
            .set_default("folio_asset_public_prefix", "/images/covers")?
            .set_default("folio_placeholder_cover", "/images/covers/placeholder.svg")?
            .set_default("folio_request_timeout_secs", 30)
    }

    /// Load settings for the running process.
    ///
    /// Reads `folio.toml` (or the file named by `FOLIO_CONFIG`) when present,
    /// then lets environment variables override it.
    pub fn load() -> Result<Self, AppError> {
        let file = std::env::var("FOLIO_CONFIG").unwrap_or_else(|_| "folio".to_string());
        Self::defaults()
            .and_then(|builder| {
                builder
                    .add_source(File::with_name(&file).required(false))
                    .add_source(Environment::default().try_parsing(true))
                    .build()
            })
            .and_then(|config| config.try_deserialize())
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {e}")))
    }

    /// Settings for the GitHub store. Fails if no access token is configured.
    pub fn github(&self) -> Result<GitHubConfig, AppError> {
        let token = self
            .github_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("GITHUB_TOKEN environment variable is not set".into()))?;

        Ok(GitHubConfig {
            token: token.to_string(),
            owner: self.github_owner.clone(),
            repo: self.github_repo.clone(),
            branch: self.github_branch.clone(),
            api_url: self.github_api_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    pub fn content(&self) -> ContentConfig {
        ContentConfig {
            content_root: self.content_root.clone(),
            asset_dir: self.asset_dir.clone(),
            asset_public_prefix: self.asset_public_prefix.clone(),
            placeholder_cover: self.placeholder_cover.clone(),
        }
    }

    pub fn admin_token(&self) -> Option<String> {
        self.admin_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Target repository and credential for the GitHub contents API.
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Build with explicit values (useful for testing).
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            api_url: api_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Where content and assets live inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    pub content_root: String,
    pub asset_dir: String,
    pub asset_public_prefix: String,
    pub placeholder_cover: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_root: "src/content".to_string(),
            asset_dir: "public/images/covers".to_string(),
            asset_public_prefix: "/images/covers".to_string(),
            placeholder_cover: "/images/covers/placeholder.svg".to_string(),
        }
    }
}

impl ContentConfig {
    /// `<content_root>/<collection>/<identity>.md`
    pub fn document_path(&self, collection: &str, identity: &str) -> String {
        format!(
            "{}/{}/{}.md",
            self.content_root.trim_end_matches('/'),
            collection,
            identity
        )
    }

    pub fn asset_path(&self, filename: &str) -> String {
        format!("{}/{}", self.asset_dir.trim_end_matches('/'), filename)
    }

    pub fn public_asset_path(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.asset_public_prefix.trim_end_matches('/'),
            filename
        )
    }
}
