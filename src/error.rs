use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;
use validator::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Product {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Invalid query parameters: {0}")]
    Query(#[from] QueryRejection),

    #[error("Invalid path parameter: {0}")]
    Path(#[from] PathRejection),

    /// Connectivity or query failure in the store. `context` names the
    /// operation the caller was attempting and becomes the `error` field of
    /// the response body.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl From<sqlx::Error> for AppError {
    fn from(source: sqlx::Error) -> Self {
        AppError::Store {
            context: "Store operation failed",
            source,
        }
    }
}

impl AppError {
    /// Relabels a store failure with the operation the handler was serving.
    /// Other variants pass through untouched.
    pub fn during(self, context: &'static str) -> Self {
        match self {
            AppError::Store { source, .. } => AppError::Store { context, source },
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(id) => {
                info!(id, "Product not found");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Product not found", "id": id })),
                )
                    .into_response()
            }
            AppError::Validation(errors) => {
                info!(%errors, "Validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Validation failed",
                        "message": errors.to_string(),
                        "details": errors,
                    })),
                )
                    .into_response()
            }
            AppError::Body(rejection) => bad_request(rejection.body_text()),
            AppError::Query(rejection) => bad_request(rejection.body_text()),
            AppError::Path(rejection) => bad_request(rejection.body_text()),
            AppError::BadRequest(message) => bad_request(message),
            AppError::Store { context, source } => {
                // The driver message stays in the log; clients get the reference.
                let reference = Uuid::new_v4();
                error!(%reference, error = %source, "{}", context);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": context,
                        "message": format!("Internal store error (reference {reference})"),
                        "reference": reference,
                    })),
                )
                    .into_response()
            }
        }
    }
}

fn bad_request(message: String) -> Response {
    info!(%message, "Rejected request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request", "message": message })),
    )
        .into_response()
}
