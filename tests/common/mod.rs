#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;

use folio::app::{router, AppState};
use folio::config::ContentConfig;
use folio::storage::memory::MemoryFileStore;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// The admin API wired to an in-memory store.
///
/// The store handle is kept so tests can inspect committed files directly.
pub struct TestEnv {
    pub router: Router,
    pub store: Arc<MemoryFileStore>,
    pub content: ContentConfig,
}

impl TestEnv {
    pub fn start() -> Self {
        Self::build(None)
    }

    /// An environment whose routes require `Authorization: Bearer ADMIN_TOKEN`.
    pub fn with_admin_token() -> Self {
        Self::build(Some(ADMIN_TOKEN.to_string()))
    }

    fn build(admin_token: Option<String>) -> Self {
        let store = Arc::new(MemoryFileStore::new());
        let content = ContentConfig::default();
        let state =
            AppState::new(store.clone(), content.clone()).with_admin_token(admin_token);

        Self {
            router: router(state),
            store,
            content,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Helper: create a project with only the required fields.
    pub async fn create_project(
        &self,
        server: &axum_test::TestServer,
        slug: &str,
        title_en: &str,
    ) -> axum_test::TestResponse {
        server
            .post("/api/projects/create")
            .json(&serde_json::json!({
                "slug": slug,
                "title_sv": format!("{title_en} (sv)"),
                "title_en": title_en,
            }))
            .await
    }

    /// Helper: the stored text of a document, if it exists.
    pub async fn document(&self, collection: &str, identity: &str) -> Option<String> {
        let path = self.content.document_path(collection, identity);
        self.store
            .get(&path)
            .await
            .map(|bytes| String::from_utf8(bytes).expect("documents are UTF-8"))
    }
}
