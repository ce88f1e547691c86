//! Client-side upload-and-clone workflow
//!
//! The coordinator that drives the two proxy endpoints in sequence:
//! - `state` - the `Workflow` state machine (upload progress, clone guard,
//!   playback tracking)
//! - `client` - `GatewayClient`, the HTTP side (streaming upload with
//!   progress events, clone request)
//! - `session` - `WorkflowSession`, glue binding one state machine to one
//!   client; one session per user workflow

mod client;
mod session;
mod state;

pub use client::{GatewayClient, GatewayError, ProgressFn};
pub use session::WorkflowSession;
pub use state::{PlaybackState, Workflow, WorkflowError, WorkflowState, format_time};
