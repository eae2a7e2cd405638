use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::content::{create_handler, delete_handler, get_handler, update_handler};
use crate::api::upload::upload_handler;
use crate::config::ContentConfig;
use crate::content::schema::{ContentSchema, Projects, Updates};
use crate::storage::client::FileStore;

/// Request bodies above this are cut off by axum. Larger than the upload
/// limit so oversized images reach the handler and get a proper 400.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state, available to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FileStore>,
    pub content: Arc<ContentConfig>,
    /// Bearer token required on every admin route, if set.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn FileStore>, content: ContentConfig) -> Self {
        Self {
            store,
            content: Arc::new(content),
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }
}

/// Routes for one collection: create plus read/update/delete by identity.
fn collection_routes<S: ContentSchema>() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_handler::<S>))
        .route(
            "/{slug}",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
}

/// Build the admin API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest(&format!("/{}", Projects::COLLECTION), collection_routes::<Projects>())
        .nest(&format!("/{}", Updates::COLLECTION), collection_routes::<Updates>())
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_admin_token,
        ));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryFileStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn app(admin_token: Option<&str>) -> Router {
        let state = AppState::new(Arc::new(MemoryFileStore::new()), ContentConfig::default())
            .with_admin_token(admin_token.map(str::to_string));
        router(state)
    }

    fn delete(uri: &str) -> axum::http::request::Builder {
        Request::builder().method("DELETE").uri(uri)
    }

    #[tokio::test]
    async fn test_unknown_document_is_a_generic_failure() {
        let response = app(None)
            .oneshot(delete("/api/projects/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to delete project");
        assert!(body["details"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_admin_token_gates_every_route() {
        let response = app(Some("s3cret"))
            .oneshot(delete("/api/updates/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(Some("s3cret"))
            .oneshot(
                delete("/api/updates/x")
                    .header(header::AUTHORIZATION, "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
