use thiserror::Error;

use crate::storage::client::StoreError;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, "is required")
    }
}

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    UploadRejected(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::UploadRejected(_) | AppError::BadRequest(_)
        )
    }
}

/// Renders field errors the way the admin forms expect them.
///
/// Missing fields are grouped into one `Missing required fields: a, b` sentence;
/// any other problems follow as `field message` clauses.
fn describe_fields(fields: &[FieldError]) -> String {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| f.message == "is required")
        .map(|f| f.field.as_str())
        .collect();
    let other: Vec<String> = fields
        .iter()
        .filter(|f| f.message != "is required")
        .map(|f| format!("{} {}", f.field, f.message))
        .collect();

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing required fields: {}", missing.join(", ")));
    }
    if !other.is_empty() {
        parts.push(format!("Invalid fields: {}", other.join("; ")));
    }
    parts.join(". ")
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
            StoreError::Unauthorized(_) => AppError::Auth(err.to_string()),
            _ => AppError::Storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_missing_fields() {
        let err = AppError::Validation(vec![
            FieldError::missing("title_sv"),
            FieldError::missing("title_en"),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: title_sv, title_en"
        );
    }

    #[test]
    fn test_validation_message_mixes_missing_and_invalid() {
        let err = AppError::Validation(vec![
            FieldError::missing("date"),
            FieldError::new("status", "must be one of: active, done, paused"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Missing required fields: date"));
        assert!(msg.contains("status must be one of: active, done, paused"));
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: AppError = StoreError::Conflict {
            path: "src/content/projects/a.md".into(),
            message: "sha does not match".into(),
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(!err.is_client_error());
    }
}
