use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sea_orm::DbErr),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    UnsupportedMediaType(String),
    Conflict(String),
    IoFailure(String),
    ProbeFailure(String),
    NoStreamData,
    RewriteFailure(String),
    EmptyOutput,
    UploadFailure(String),
    PersistFailure(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(e) => {
                eprintln!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnsupportedMediaType(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::IoFailure(msg) => {
                eprintln!("Staging error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload".to_string())
            }
            AppError::ProbeFailure(msg) => {
                eprintln!("Probe error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze video".to_string())
            }
            AppError::NoStreamData => {
                eprintln!("Probe error: no stream data in output");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze video".to_string())
            }
            AppError::RewriteFailure(msg) => {
                eprintln!("Transcode error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process video".to_string())
            }
            AppError::EmptyOutput => {
                eprintln!("Transcode error: processed file is empty");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process video".to_string())
            }
            AppError::UploadFailure(msg) => {
                eprintln!("S3 Upload Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store video".to_string())
            }
            AppError::PersistFailure(msg) => {
                eprintln!("Record update error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update video record".to_string())
            }
            AppError::InternalServerError(msg) => {
                eprintln!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err)
    }
}
