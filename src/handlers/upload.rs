//! Upload proxy handler
//!
//! Receives a multipart file from the client, rebuilds an outbound multipart
//! body with the same file and purpose tag, and forwards it to the vendor's
//! file-upload endpoint with the server-held bearer credential and group
//! identifier. The vendor's JSON body is returned to the caller verbatim.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Purpose tag the front end attaches to every upload. Used as a fallback
/// when the client omits the field.
pub const DEFAULT_PURPOSE: &str = "voice_clone";

/// Fallback filename for the outbound multipart part when the client did not
/// send one.
const DEFAULT_FILE_NAME: &str = "audio";

struct UploadedFile {
    data: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
}

/// `POST /api/upload`
///
/// Responses:
/// - 200 with the vendor JSON body on proxy-level success. The vendor body is
///   not inspected; a vendor-side error envelope is passed through as-is (the
///   client owns interpretation), with a warning logged when the vendor HTTP
///   status was non-success.
/// - 400 `{ "error": "No file provided" }` when the `file` field is missing;
///   no outbound call is made.
/// - 500 `{ "error": "Upload failed" }` on transport or parse failure.
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file: Option<UploadedFile> = None;
    let mut purpose: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart upload body: {}", e);
        AppError::MissingInput("Invalid multipart body".to_string())
    })? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await.map_err(|e| {
                    warn!("Failed to read uploaded file field: {}", e);
                    AppError::MissingInput("Invalid multipart body".to_string())
                })?;
                file = Some(UploadedFile {
                    data,
                    file_name,
                    content_type,
                });
            }
            Some("purpose") => {
                purpose = Some(field.text().await.map_err(|e| {
                    warn!("Failed to read purpose field: {}", e);
                    AppError::MissingInput("Invalid multipart body".to_string())
                })?);
            }
            _ => {}
        }
    }

    let Some(file) = file else {
        warn!("Upload request rejected: no file field present");
        return Err(AppError::MissingInput("No file provided".to_string()));
    };
    let purpose = purpose.unwrap_or_else(|| DEFAULT_PURPOSE.to_string());
    let size = file.data.len();

    // Rebuild the multipart body for the vendor, preserving filename and
    // content type when the client supplied them.
    let mut part = Part::stream_with_length(reqwest::Body::from(file.data), size as u64).file_name(
        file.file_name
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
    );
    if let Some(content_type) = &file.content_type {
        part = part.mime_str(content_type).map_err(|e| {
            error!("Invalid content type on uploaded file: {}", e);
            AppError::UploadFailed
        })?;
    }
    let form = Form::new()
        .part("file", part)
        .text("purpose", purpose.clone());

    let response = state
        .http
        .post(&state.config.upload_endpoint)
        .query(&[("GroupId", state.config.group_id.as_str())])
        .bearer_auth(&state.config.api_key)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            error!("Upload request to vendor failed: {}", e);
            AppError::UploadFailed
        })?;

    let status = response.status();
    let body: Value = response.json().await.map_err(|e| {
        error!("Failed to parse vendor upload response: {}", e);
        AppError::UploadFailed
    })?;

    if !status.is_success() {
        // Body is still forwarded verbatim with a 200; the client interprets
        // the vendor envelope.
        warn!(
            vendor_status = %status,
            "Vendor upload endpoint returned non-success status"
        );
    }

    info!(size, purpose = %purpose, "Upload proxied to vendor");
    Ok(Json(body))
}
