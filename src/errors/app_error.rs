//! Application error type shared by the proxy handlers
//!
//! Every error maps to the documented wire contract: a JSON body of the form
//! `{ "error": "<message>" }` with a 400 status for client-input problems and
//! a 500 status for transport or vendor-reported failures. Detail beyond the
//! message is logged server-side at the point of failure, never leaked to the
//! caller.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client input rejected before any outbound call was made.
    #[error("{0}")]
    MissingInput(String),

    /// The vendor reported a failure; its message is surfaced verbatim.
    #[error("{0}")]
    VendorRejected(String),

    /// Transport or parse failure on the upload path.
    #[error("Upload failed")]
    UploadFailed,

    /// Transport or parse failure on the clone path.
    #[error("Clone failed")]
    CloneFailed,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,
            AppError::VendorRejected(_) | AppError::UploadFailed | AppError::CloneFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
