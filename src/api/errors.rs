use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AppError;

/// Direct conversion used outside the content handlers (e.g. the admin gate).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::UploadRejected(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Failure response of a content or upload operation.
///
/// Input problems become `400 {error, fields?}`. Every other failure becomes
/// `500 {error: <operation context>, details}`, whatever its cause.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    pub fn failed(context: &str, err: AppError) -> Self {
        if err.is_client_error() {
            tracing::warn!("{context}: {err}");
            let mut body = json!({ "error": err.to_string() });
            if let AppError::Validation(fields) = &err {
                body["fields"] = json!(fields);
            }
            return Self {
                status: StatusCode::BAD_REQUEST,
                body,
            };
        }

        tracing::error!("{context}: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({
                "error": context,
                "details": err.to_string(),
            }),
        }
    }

    /// Like [`ApiError::failed`], but a missing document is reported as 404.
    pub fn lookup_failed(context: &str, err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => {
                tracing::debug!("{context}: {msg}");
                Self {
                    status: StatusCode::NOT_FOUND,
                    body: json!({ "error": msg }),
                }
            }
            other => Self::failed(context, other),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn test_validation_is_bad_request_with_fields() {
        let err = ApiError::failed(
            "Failed to create project",
            AppError::Validation(vec![FieldError::missing("title_en")]),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body["error"], "Missing required fields: title_en");
        assert_eq!(err.body["fields"][0]["field"], "title_en");
        assert!(err.body.get("details").is_none());
    }

    #[test]
    fn test_store_failures_share_one_shape() {
        for cause in [
            AppError::Conflict("stale".into()),
            AppError::Auth("bad credentials".into()),
            AppError::NotFound("gone".into()),
        ] {
            let msg = cause.to_string();
            let err = ApiError::failed("Failed to update project", cause);
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.body["error"], "Failed to update project");
            assert_eq!(err.body["details"], msg);
        }
    }

    #[test]
    fn test_lookup_maps_not_found_to_404() {
        let err = ApiError::lookup_failed("Failed to load project", AppError::NotFound("x".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
