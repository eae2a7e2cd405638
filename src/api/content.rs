use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::app::AppState;
use crate::config::ContentConfig;
use crate::content::frontmatter;
use crate::content::schema::{
    derive_identity, is_valid_identity, validate, ContentSchema, MappingContext, Operation,
};
use crate::error::AppError;
use crate::storage::client::{FileStore, StoredFile};

/// Response from a successful create.
#[derive(Debug, Serialize, PartialEq)]
pub struct CreateResponse {
    pub success: bool,
    /// Identity of the new document.
    pub slug: String,
    pub message: String,
}

/// Response from a successful update or delete.
#[derive(Debug, Serialize, PartialEq)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

/// A stored document flattened back into its form shape.
#[derive(Debug, Serialize)]
pub struct DocumentView<P> {
    pub slug: String,
    #[serde(flatten)]
    pub payload: P,
}

fn context<S: ContentSchema>(verb: &str) -> String {
    format!("Failed to {verb} {}", S::LABEL)
}

/// Read an existing document by identity, failing with `NotFound` if absent.
async fn read_existing<S: ContentSchema>(
    store: &dyn FileStore,
    content: &ContentConfig,
    identity: &str,
) -> Result<(String, StoredFile), AppError> {
    if !is_valid_identity(identity) {
        return Err(AppError::NotFound(format!("{} '{identity}'", S::LABEL)));
    }

    let path = content.document_path(S::COLLECTION, identity);
    match store.read_file(&path).await? {
        Some(file) => Ok((path, file)),
        None => Err(AppError::NotFound(format!("{} '{identity}'", S::LABEL))),
    }
}

/// Core create logic, separated from the HTTP layer for testability.
///
/// Validates the payload, derives the document identity and writes the
/// rendered file with no expected token, so an existing document is never
/// overwritten.
pub async fn process_create<S: ContentSchema>(
    store: &dyn FileStore,
    content: &ContentConfig,
    payload: S::Payload,
    today: NaiveDate,
) -> Result<CreateResponse, AppError> {
    validate::<S>(&payload, Operation::Create)?;
    let identity = derive_identity::<S>(&payload)?;

    let ctx = MappingContext { today, content };
    let frontmatter = S::to_frontmatter(&payload, &ctx);
    let body = S::body(&payload).unwrap_or(S::DEFAULT_BODY);
    let rendered = frontmatter::render(&frontmatter, body)?;

    let path = content.document_path(S::COLLECTION, &identity);
    let message = format!("admin: add {} {identity}", S::LABEL);
    store
        .write_file(&path, rendered.into_bytes(), &message, None)
        .await?;

    tracing::info!(path = %path, "Created {} {identity}", S::LABEL);

    Ok(CreateResponse {
        success: true,
        message: format!("Created {} {identity}", S::LABEL),
        slug: identity,
    })
}

/// Core update logic. The identity comes from the route, never the payload.
pub async fn process_update<S: ContentSchema>(
    store: &dyn FileStore,
    content: &ContentConfig,
    identity: &str,
    payload: S::Payload,
    today: NaiveDate,
) -> Result<MutationResponse, AppError> {
    validate::<S>(&payload, Operation::Update)?;
    let (path, existing) = read_existing::<S>(store, content, identity).await?;

    let ctx = MappingContext { today, content };
    let frontmatter = S::to_frontmatter(&payload, &ctx);
    let rendered = frontmatter::render(&frontmatter, S::body(&payload).unwrap_or_default())?;

    let message = format!("admin: update {} {identity}", S::LABEL);
    store
        .write_file(&path, rendered.into_bytes(), &message, Some(existing.token))
        .await?;

    tracing::info!(path = %path, "Updated {} {identity}", S::LABEL);

    Ok(MutationResponse {
        success: true,
        message: format!("Updated {} {identity}", S::LABEL),
    })
}

pub async fn process_delete<S: ContentSchema>(
    store: &dyn FileStore,
    content: &ContentConfig,
    identity: &str,
) -> Result<MutationResponse, AppError> {
    let (path, existing) = read_existing::<S>(store, content, identity).await?;

    let message = format!("admin: delete {} {identity}", S::LABEL);
    store.delete_file(&path, existing.token, &message).await?;

    tracing::info!(path = %path, "Deleted {} {identity}", S::LABEL);

    Ok(MutationResponse {
        success: true,
        message: format!("Deleted {} {identity}", S::LABEL),
    })
}

/// Load a stored document in the flat shape the editor submits.
pub async fn process_get<S: ContentSchema>(
    store: &dyn FileStore,
    content: &ContentConfig,
    identity: &str,
) -> Result<DocumentView<S::Payload>, AppError> {
    let (_, existing) = read_existing::<S>(store, content, identity).await?;
    let document = frontmatter::parse::<S::Frontmatter>(existing.text()?)?;

    Ok(DocumentView {
        slug: identity.to_string(),
        payload: S::to_payload(document),
    })
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Axum handler for `POST /api/<collection>/create`.
pub async fn create_handler<S: ContentSchema>(
    State(state): State<AppState>,
    payload: Result<Json<S::Payload>, JsonRejection>,
) -> Result<Json<CreateResponse>, ApiError> {
    let ctx = context::<S>("create");
    let payload = json_body(payload).map_err(|e| ApiError::failed(&ctx, e))?;

    process_create::<S>(state.store.as_ref(), &state.content, payload, today())
        .await
        .map(Json)
        .map_err(|e| ApiError::failed(&ctx, e))
}

/// Axum handler for `PUT /api/<collection>/{slug}`.
pub async fn update_handler<S: ContentSchema>(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    payload: Result<Json<S::Payload>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let ctx = context::<S>("update");
    let payload = json_body(payload).map_err(|e| ApiError::failed(&ctx, e))?;

    process_update::<S>(
        state.store.as_ref(),
        &state.content,
        &identity,
        payload,
        today(),
    )
    .await
    .map(Json)
    .map_err(|e| ApiError::failed(&ctx, e))
}

/// Axum handler for `DELETE /api/<collection>/{slug}`.
pub async fn delete_handler<S: ContentSchema>(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    process_delete::<S>(state.store.as_ref(), &state.content, &identity)
        .await
        .map(Json)
        .map_err(|e| ApiError::failed(&context::<S>("delete"), e))
}

/// Axum handler for `GET /api/<collection>/{slug}`.
pub async fn get_handler<S: ContentSchema>(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<DocumentView<S::Payload>>, ApiError> {
    process_get::<S>(state.store.as_ref(), &state.content, &identity)
        .await
        .map(Json)
        .map_err(|e| ApiError::lookup_failed(&context::<S>("load"), e))
}
