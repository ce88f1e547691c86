//! Workflow state machine
//!
//! Models the upload-and-clone flow as a tagged-variant state type so that
//! illegal combinations (cloning while uploading, playback without a result)
//! are unrepresentable. Transitions are pure functions over the state; all
//! network activity lives in `GatewayClient` and is sequenced by
//! `WorkflowSession`.

use serde_json::Value;
use thiserror::Error;

/// Playback tracking for the cloned result audio.
///
/// Values are fed in by the embedding player's callbacks; the workflow does
/// no audio processing of its own.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Elapsed playback time in seconds
    pub current_time: f64,
    /// Total duration in seconds (0.0 until the player reports it)
    pub duration: f64,
}

/// The linear flow: `Idle → Uploading → Uploaded → Cloning → Cloned`.
///
/// A failed upload returns to `Idle`; a failed clone returns to `Uploaded`
/// with the file identifier retained, so retrying the clone never requires a
/// re-upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading {
        /// 0-100, driven by byte-level progress events
        progress: u8,
    },
    Uploaded {
        file_id: String,
    },
    Cloning {
        file_id: String,
    },
    Cloned {
        file_id: String,
        audio_url: String,
        playback: PlaybackState,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Clone preconditions unmet: no uploaded file or empty voice name.
    #[error("Please provide both file and voice name")]
    MissingVoiceOrFile,

    /// Clone precondition unmet: text empty after trimming.
    #[error("Please enter text for voice cloning")]
    EmptyText,

    /// An upload or clone is already in flight; duplicate submissions are
    /// rejected without a network call.
    #[error("Another operation is in progress")]
    Busy,

    /// A transition was requested from a state it does not apply to.
    #[error("Invalid workflow state for this operation")]
    InvalidState,

    /// The upload response did not carry a file identifier.
    #[error("Upload failed")]
    MalformedUploadResponse,

    /// The clone response did not carry a demo audio URL.
    #[error("Clone failed")]
    MalformedCloneResponse,

    /// The upload attempt failed; the message is surfaced to the user.
    #[error("{0}")]
    UploadFailed(String),

    /// The clone attempt failed; the message is surfaced to the user.
    #[error("{0}")]
    CloneFailed(String),
}

/// The workflow coordinator's state: current position in the flow, the user's
/// pending inputs, and the last error of each kind.
///
/// Owned by exactly one session; mutated only by user actions and network
/// callbacks.
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
    /// Free-text label for the cloned voice; must be non-empty to clone
    pub voice_name: String,
    /// Source text for synthesis; must be non-empty after trimming to clone
    pub text: String,
    upload_error: Option<String>,
    clone_error: Option<String>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    pub fn clone_error(&self) -> Option<&str> {
        self.clone_error.as_deref()
    }

    /// Current upload progress percentage, present only while uploading.
    pub fn upload_progress(&self) -> Option<u8> {
        match self.state {
            WorkflowState::Uploading { progress } => Some(progress),
            _ => None,
        }
    }

    /// File selected: start a fresh upload. Any prior result and errors are
    /// discarded; selecting a new file restarts the flow.
    pub fn begin_upload(&mut self) {
        self.upload_error = None;
        self.clone_error = None;
        self.state = WorkflowState::Uploading { progress: 0 };
    }

    /// Byte-level progress event. The percentage is recomputed only when the
    /// total byte count is known; otherwise the last value is kept.
    pub fn on_upload_progress(&mut self, sent: u64, total: Option<u64>) {
        if let WorkflowState::Uploading { progress } = &mut self.state {
            if let Some(total) = total.filter(|total| *total > 0) {
                let percent = (sent as f64 * 100.0 / total as f64).round();
                *progress = percent.clamp(0.0, 100.0) as u8;
            }
        }
    }

    /// Upload finished: extract the vendor-assigned file identifier from the
    /// response and move to `Uploaded`.
    ///
    /// The identifier is treated as opaque; numeric identifiers are carried
    /// as their decimal string form. A response without one is an upload
    /// failure.
    pub fn complete_upload(&mut self, response: &Value) -> Result<(), WorkflowError> {
        if !matches!(self.state, WorkflowState::Uploading { .. }) {
            return Err(WorkflowError::InvalidState);
        }
        match response.pointer("/file/file_id") {
            Some(Value::String(file_id)) if !file_id.is_empty() => {
                self.state = WorkflowState::Uploaded {
                    file_id: file_id.clone(),
                };
                Ok(())
            }
            Some(Value::Number(file_id)) => {
                self.state = WorkflowState::Uploaded {
                    file_id: file_id.to_string(),
                };
                Ok(())
            }
            _ => {
                self.fail_upload("Upload failed");
                Err(WorkflowError::MalformedUploadResponse)
            }
        }
    }

    /// Upload failed: surface the message and return to `Idle`. Leaving
    /// `Uploading` clears the in-flight progress indicator on every exit
    /// path.
    pub fn fail_upload(&mut self, message: &str) {
        self.state = WorkflowState::Idle;
        self.upload_error = Some(message.to_string());
    }

    /// Whether the clone action is currently allowed. UIs use this to
    /// enable/disable the trigger control.
    pub fn can_request_clone(&self) -> bool {
        self.validate_clone().is_ok()
    }

    /// Check the clone preconditions: a file identifier from a prior upload,
    /// a non-empty voice name, non-empty trimmed text, and no operation in
    /// flight. Returns the file identifier to clone with.
    pub fn validate_clone(&self) -> Result<&str, WorkflowError> {
        let file_id = match &self.state {
            WorkflowState::Uploaded { file_id } => file_id,
            // A finished clone keeps its file id usable for another run
            WorkflowState::Cloned { file_id, .. } => file_id,
            WorkflowState::Uploading { .. } | WorkflowState::Cloning { .. } => {
                return Err(WorkflowError::Busy);
            }
            WorkflowState::Idle => return Err(WorkflowError::MissingVoiceOrFile),
        };
        if self.voice_name.is_empty() {
            return Err(WorkflowError::MissingVoiceOrFile);
        }
        if self.text.trim().is_empty() {
            return Err(WorkflowError::EmptyText);
        }
        Ok(file_id)
    }

    /// Clone requested: enforce the preconditions and move to `Cloning`.
    /// Returns the file identifier the request must carry. Rejected
    /// transitions surface a validation error and must not trigger a network
    /// call.
    pub fn begin_clone(&mut self) -> Result<String, WorkflowError> {
        let file_id = match self.validate_clone() {
            Ok(file_id) => file_id.to_string(),
            Err(e) => {
                self.clone_error = Some(e.to_string());
                return Err(e);
            }
        };
        self.clone_error = None;
        self.state = WorkflowState::Cloning {
            file_id: file_id.clone(),
        };
        Ok(file_id)
    }

    /// Clone finished: extract the demo audio URL and move to `Cloned`.
    pub fn complete_clone(&mut self, response: &Value) -> Result<(), WorkflowError> {
        let file_id = match &self.state {
            WorkflowState::Cloning { file_id } => file_id.clone(),
            _ => return Err(WorkflowError::InvalidState),
        };
        match response.get("demo_audio").and_then(Value::as_str) {
            Some(audio_url) if !audio_url.is_empty() => {
                self.state = WorkflowState::Cloned {
                    file_id,
                    audio_url: audio_url.to_string(),
                    playback: PlaybackState::default(),
                };
                Ok(())
            }
            _ => {
                self.fail_clone("Clone failed");
                Err(WorkflowError::MalformedCloneResponse)
            }
        }
    }

    /// Clone failed: surface the message and return to `Uploaded`, keeping
    /// the file identifier so a retry does not require a re-upload.
    pub fn fail_clone(&mut self, message: &str) {
        if let WorkflowState::Cloning { file_id } = &self.state {
            let file_id = file_id.clone();
            self.state = WorkflowState::Uploaded { file_id };
        }
        self.clone_error = Some(message.to_string());
    }

    /// Result audio URL, present only once cloning completed.
    pub fn audio_url(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Cloned { audio_url, .. } => Some(audio_url),
            _ => None,
        }
    }

    pub fn playback(&self) -> Option<PlaybackState> {
        match &self.state {
            WorkflowState::Cloned { playback, .. } => Some(*playback),
            _ => None,
        }
    }

    /// Toggle play/pause. Returns the new playing flag, or `None` when no
    /// result audio exists.
    pub fn toggle_playback(&mut self) -> Option<bool> {
        match &mut self.state {
            WorkflowState::Cloned { playback, .. } => {
                playback.is_playing = !playback.is_playing;
                Some(playback.is_playing)
            }
            _ => None,
        }
    }

    /// Player time callback: elapsed and total seconds.
    pub fn on_time_update(&mut self, current_time: f64, duration: f64) {
        if let WorkflowState::Cloned { playback, .. } = &mut self.state {
            playback.current_time = current_time;
            playback.duration = duration;
        }
    }

    /// Player finished the track.
    pub fn on_playback_ended(&mut self) {
        if let WorkflowState::Cloned { playback, .. } = &mut self.state {
            playback.is_playing = false;
            playback.current_time = 0.0;
        }
    }

    /// Filename for downloading the result: `cloned_voice_{voice_name}.mp3`
    /// with path separators sanitized. Present only in the `Cloned` state.
    pub fn download_filename(&self) -> Option<String> {
        match &self.state {
            WorkflowState::Cloned { .. } => {
                let base: String = self
                    .voice_name
                    .chars()
                    .map(|c| if c == '/' || c == '\\' { '_' } else { c })
                    .collect();
                Some(format!("cloned_voice_{}.mp3", base))
            }
            _ => None,
        }
    }
}

/// Format a time position as `minutes:seconds` with zero-padded seconds.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
