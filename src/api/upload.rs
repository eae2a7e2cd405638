use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::app::AppState;
use crate::config::ContentConfig;
use crate::content::slug::slugify;
use crate::error::AppError;
use crate::storage::client::FileStore;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Declared media types accepted for cover images.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const CONTEXT: &str = "Failed to upload image";

/// A file pulled out of the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Response from a successful image upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Public path the site serves the image from.
    pub path: String,
    pub filename: String,
    pub message: String,
}

/// Derive the stored filename: `<millis>-<slugified stem><.original ext>`.
///
/// The extension keeps its original case. A stem with nothing sluggable
/// becomes `image`.
pub fn asset_filename(original: &str, timestamp_millis: i64) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext: String = ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            (stem, (!ext.is_empty()).then_some(ext))
        }
        _ => (base, None),
    };

    let mut slug = slugify(stem);
    if slug.is_empty() {
        slug = "image".to_string();
    }

    match extension {
        Some(ext) => format!("{timestamp_millis}-{slug}.{ext}"),
        None => format!("{timestamp_millis}-{slug}"),
    }
}

/// Core upload logic: check type then size, then write the blob as a new file.
pub async fn process_upload(
    store: &dyn FileStore,
    content: &ContentConfig,
    file: UploadedFile,
    timestamp_millis: i64,
) -> Result<UploadResponse, AppError> {
    let media_type = file.content_type.to_ascii_lowercase();
    if !ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(AppError::UploadRejected(format!(
            "Invalid file type '{}'. Allowed: JPEG, PNG, GIF, WebP, SVG",
            file.content_type
        )));
    }

    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::UploadRejected(format!(
            "File too large ({} bytes). Maximum size is 5 MiB",
            file.data.len()
        )));
    }

    let filename = asset_filename(&file.file_name, timestamp_millis);
    let repo_path = content.asset_path(&filename);
    let message = format!("admin: upload cover image {filename}");

    store.write_file(&repo_path, file.data, &message, None).await?;

    tracing::info!(path = %repo_path, "Uploaded cover image");

    Ok(UploadResponse {
        success: true,
        path: content.public_asset_path(&filename),
        message: format!("Uploaded {filename}"),
        filename,
    })
}

/// Pull the `file` field out of the form. Other fields are ignored.
async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    Err(AppError::BadRequest("No file provided".into()))
}

/// Axum handler for `POST /api/upload`.
///
/// Accepts a multipart form with a single file field named "file" and
/// commits it under the configured asset directory.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let file = read_file_field(&mut multipart)
        .await
        .map_err(|e| ApiError::failed(CONTEXT, e))?;

    let timestamp = chrono::Utc::now().timestamp_millis();
    process_upload(state.store.as_ref(), &state.content, file, timestamp)
        .await
        .map(Json)
        .map_err(|e| ApiError::failed(CONTEXT, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::client::{ContentToken, MockFileStore};
    use crate::storage::memory::MemoryFileStore;

    fn png(name: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: vec![0u8; len],
        }
    }

    #[test]
    fn test_filename_keeps_extension_case() {
        assert_eq!(asset_filename("My Cover!!.PNG", 1700000000000), "1700000000000-my-cover.PNG");
        assert_eq!(asset_filename("photo.final.jpeg", 1), "1-photo-final.jpeg");
    }

    #[test]
    fn test_filename_edge_cases() {
        assert_eq!(asset_filename("README", 5), "5-readme");
        assert_eq!(asset_filename("!!!.png", 5), "5-image.png");
        assert_eq!(asset_filename(".png", 5), "5-png");
        assert_eq!(asset_filename("../../etc/passwd.svg", 5), "5-passwd.svg");
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_store() {
        let mut store = MockFileStore::new();
        store.expect_write_file().never();

        let err = process_upload(
            &store,
            &ContentConfig::default(),
            png("big.png", 6 * 1024 * 1024),
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UploadRejected(_)));
    }

    #[tokio::test]
    async fn test_disallowed_type_rejected() {
        let mut store = MockFileStore::new();
        store.expect_write_file().never();

        let mut file = png("notes.txt", 10);
        file.content_type = "text/plain".into();
        let err = process_upload(&store, &ContentConfig::default(), file, 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text/plain"));
    }

    #[tokio::test]
    async fn test_upload_writes_new_file() {
        let mut store = MockFileStore::new();
        store
            .expect_write_file()
            .withf(|path, content, message, expected| {
                path.ends_with("public/images/covers/42-my-cover.PNG")
                    && content.len() == 2 * 1024 * 1024
                    && message.ends_with("42-my-cover.PNG")
                    && expected.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(ContentToken::new("sha")));

        let response = process_upload(
            &store,
            &ContentConfig::default(),
            png("My Cover!!.PNG", 2 * 1024 * 1024),
            42,
        )
        .await
        .unwrap();
        assert_eq!(response.filename, "42-my-cover.PNG");
        assert_eq!(response.path, "/images/covers/42-my-cover.PNG");
    }

    #[tokio::test]
    async fn test_upload_exactly_at_limit() {
        let store = MemoryFileStore::new();
        let response = process_upload(
            &store,
            &ContentConfig::default(),
            png("a.png", MAX_UPLOAD_BYTES),
            7,
        )
        .await
        .unwrap();
        assert!(response.success);
        assert_eq!(
            store.commits().await[0].message,
            "admin: upload cover image 7-a.png"
        );
    }
}
