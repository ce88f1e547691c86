//! Workflow session: one state machine bound to one gateway client
//!
//! A session owns the full user workflow for a single page/CLI session. The
//! state machine is behind a mutex only so the streaming upload's progress
//! callback can feed it while the request future is in flight; no two
//! sessions share state.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::client::{GatewayClient, GatewayError, ProgressFn};
use super::state::{PlaybackState, Workflow, WorkflowError, WorkflowState};
use crate::handlers::upload::DEFAULT_PURPOSE;

pub struct WorkflowSession {
    client: GatewayClient,
    workflow: Arc<Mutex<Workflow>>,
}

impl WorkflowSession {
    /// Create a session talking to a gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: GatewayClient::new(base_url),
            workflow: Arc::new(Mutex::new(Workflow::new())),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.lock().state().clone()
    }

    pub fn upload_error(&self) -> Option<String> {
        self.workflow.lock().upload_error().map(str::to_owned)
    }

    pub fn clone_error(&self) -> Option<String> {
        self.workflow.lock().clone_error().map(str::to_owned)
    }

    pub fn upload_progress(&self) -> Option<u8> {
        self.workflow.lock().upload_progress()
    }

    pub fn set_voice_name(&self, voice_name: impl Into<String>) {
        self.workflow.lock().voice_name = voice_name.into();
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.workflow.lock().text = text.into();
    }

    /// Whether the clone action should currently be enabled.
    pub fn can_request_clone(&self) -> bool {
        self.workflow.lock().can_request_clone()
    }

    /// Upload a selected file through the gateway.
    ///
    /// Drives `Idle → Uploading → Uploaded`, feeding byte-level progress into
    /// the state machine as the body streams out. Every exit path leaves the
    /// `Uploading` state, so the progress indicator is cleared whether the
    /// attempt succeeded or failed. Returns the vendor-assigned file
    /// identifier.
    pub async fn upload_file(
        &self,
        file_name: &str,
        data: Bytes,
    ) -> Result<String, WorkflowError> {
        self.workflow.lock().begin_upload();

        let progress_sink = Arc::clone(&self.workflow);
        let on_progress: ProgressFn = Arc::new(move |sent, total| {
            progress_sink.lock().on_upload_progress(sent, total);
        });

        let result = self
            .client
            .upload(file_name, data, DEFAULT_PURPOSE, on_progress)
            .await;

        let mut workflow = self.workflow.lock();
        match result {
            Ok(body) => {
                workflow.complete_upload(&body)?;
                match workflow.state() {
                    WorkflowState::Uploaded { file_id } => {
                        info!(file_id = %file_id, "Upload complete");
                        Ok(file_id.clone())
                    }
                    _ => Err(WorkflowError::InvalidState),
                }
            }
            Err(e) => {
                let message = error_message(&e);
                warn!("Upload failed: {}", message);
                workflow.fail_upload(&message);
                Err(WorkflowError::UploadFailed(message))
            }
        }
    }

    /// Request a clone for the uploaded file with the session's voice name
    /// and text.
    ///
    /// Preconditions are enforced before any network call; a failed clone
    /// returns the workflow to `Uploaded` with the file identifier retained.
    /// Returns the result audio URL.
    pub async fn request_clone(&self) -> Result<String, WorkflowError> {
        let (file_id, voice_name, text) = {
            let mut workflow = self.workflow.lock();
            let file_id = workflow.begin_clone()?;
            (file_id, workflow.voice_name.clone(), workflow.text.clone())
        };

        let result = self.client.clone_voice(&file_id, &voice_name, &text).await;

        let mut workflow = self.workflow.lock();
        match result {
            Ok(body) => {
                workflow.complete_clone(&body)?;
                let audio_url = workflow
                    .audio_url()
                    .map(str::to_owned)
                    .unwrap_or_default();
                info!(voice_name = %voice_name, "Clone complete");
                Ok(audio_url)
            }
            Err(e) => {
                let message = error_message(&e);
                warn!("Clone failed: {}", message);
                workflow.fail_clone(&message);
                Err(WorkflowError::CloneFailed(message))
            }
        }
    }

    // Playback passthroughs, available once cloning completed.

    pub fn audio_url(&self) -> Option<String> {
        self.workflow.lock().audio_url().map(str::to_owned)
    }

    pub fn playback(&self) -> Option<PlaybackState> {
        self.workflow.lock().playback()
    }

    pub fn toggle_playback(&self) -> Option<bool> {
        self.workflow.lock().toggle_playback()
    }

    pub fn on_time_update(&self, current_time: f64, duration: f64) {
        self.workflow.lock().on_time_update(current_time, duration);
    }

    pub fn on_playback_ended(&self) {
        self.workflow.lock().on_playback_ended();
    }

    pub fn download_filename(&self) -> Option<String> {
        self.workflow.lock().download_filename()
    }
}

/// User-facing message for a gateway failure: the gateway's error body when
/// it sent one, a generic message for transport problems.
fn error_message(error: &GatewayError) -> String {
    match error {
        GatewayError::Rejected { message, .. } => message.clone(),
        GatewayError::Transport(_) => "Network error".to_string(),
    }
}
