//! Clone proxy handler
//!
//! Forwards a voice-clone request to the vendor's endpoint with the
//! server-held credentials and the fixed model selector. Vendor-reported
//! failures surface the vendor's message as the proxy's own error.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Model selector sent with every clone request.
pub const CLONE_MODEL: &str = "speech-02-hd";

/// Client-facing clone request.
///
/// All fields default to empty so that a missing field yields the documented
/// 400 response instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneVoiceRequest {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub voice_name: String,
    /// Forwarded even when empty; non-empty-text validation lives in the
    /// workflow coordinator, not here.
    #[serde(default)]
    pub text: String,
}

/// Outbound vendor request body. The client's `voice_name` becomes the
/// vendor's `voice_id`.
#[derive(Debug, Serialize)]
struct VendorCloneRequest<'a> {
    file_id: &'a str,
    voice_id: &'a str,
    text: &'a str,
    model: &'a str,
}

// Presence check only; a whitespace-only value is forwarded as-is and left
// to the vendor to judge.
fn has_required_parameters(request: &CloneVoiceRequest) -> bool {
    !request.file_id.is_empty() && !request.voice_name.is_empty()
}

/// `POST /api/clone`
///
/// Responses:
/// - 200 with the vendor JSON body verbatim on success (expected to carry a
///   `demo_audio` URL).
/// - 400 `{ "error": "Missing required parameters" }` when `file_id` or
///   `voice_name` is absent or empty; no outbound call is made.
/// - 500 `{ "error": <vendor message or "Clone failed"> }` on vendor-reported
///   or transport failure.
pub async fn clone_voice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CloneVoiceRequest>,
) -> AppResult<Json<Value>> {
    if !has_required_parameters(&request) {
        warn!("Clone request rejected: file_id or voice_name missing");
        return Err(AppError::MissingInput(
            "Missing required parameters".to_string(),
        ));
    }

    let response = state
        .http
        .post(&state.config.clone_endpoint)
        .query(&[("GroupId", state.config.group_id.as_str())])
        .bearer_auth(&state.config.api_key)
        .json(&VendorCloneRequest {
            file_id: &request.file_id,
            voice_id: &request.voice_name,
            text: &request.text,
            model: CLONE_MODEL,
        })
        .send()
        .await
        .map_err(|e| {
            error!("Clone request to vendor failed: {}", e);
            AppError::CloneFailed
        })?;

    let status = response.status();
    let body: Value = response.json().await.map_err(|e| {
        error!("Failed to parse vendor clone response: {}", e);
        AppError::CloneFailed
    })?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Clone failed")
            .to_string();
        error!(
            vendor_status = %status,
            "Vendor clone endpoint rejected request: {}", message
        );
        return Err(AppError::VendorRejected(message));
    }

    info!(voice_name = %request.voice_name, "Clone proxied to vendor");
    Ok(Json(body))
}
