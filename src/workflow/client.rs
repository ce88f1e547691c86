//! HTTP client for the gateway's proxy endpoints
//!
//! The upload streams its body through a byte-counting chunk stream so the
//! caller receives periodic `(sent, total)` progress events while the request
//! body is consumed, mirroring browser upload-progress events.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use thiserror::Error;

/// Progress callback: `(bytes_sent, total_bytes)`. The total is `None` when
/// unknown.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Chunk size for the progress-reporting upload stream.
const PROGRESS_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error")]
    Transport(#[from] reqwest::Error),

    /// The gateway rejected the request; `message` carries the body's
    /// `error` field when present.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Thin client over the gateway's `/api/upload` and `/api/clone` routes.
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Upload a file through the gateway, emitting progress events as the
    /// body is streamed out. Returns the vendor's JSON body.
    pub async fn upload(
        &self,
        file_name: &str,
        data: Bytes,
        purpose: &str,
        on_progress: ProgressFn,
    ) -> Result<Value, GatewayError> {
        let total = data.len() as u64;
        let body = reqwest::Body::wrap_stream(progress_stream(data, on_progress));
        let part = Part::stream_with_length(body, total).file_name(file_name.to_owned());
        let form = Form::new()
            .part("file", part)
            .text("purpose", purpose.to_owned());

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::into_json(response).await
    }

    /// Request a voice clone through the gateway. Returns the vendor's JSON
    /// body.
    pub async fn clone_voice(
        &self,
        file_id: &str,
        voice_name: &str,
        text: &str,
    ) -> Result<Value, GatewayError> {
        let response = self
            .http
            .post(format!("{}/api/clone", self.base_url))
            .json(&json!({
                "file_id": file_id,
                "voice_name": voice_name,
                "text": text,
            }))
            .send()
            .await?;

        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .as_ref()
                .and_then(|body| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

/// Split `data` into chunks and report the cumulative byte count after each
/// chunk is handed to the transport.
fn progress_stream(
    data: Bytes,
    on_progress: ProgressFn,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
    let total = data.len() as u64;
    futures_util::stream::unfold((data, 0u64), move |(mut remaining, sent)| {
        let on_progress = Arc::clone(&on_progress);
        async move {
            if remaining.is_empty() {
                return None;
            }
            let take = remaining.len().min(PROGRESS_CHUNK_BYTES);
            let chunk = remaining.split_to(take);
            let sent = sent + take as u64;
            on_progress(sent, Some(total));
            Some((Ok(chunk), (remaining, sent)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_progress_stream_reports_cumulative_bytes() {
        let events: Arc<Mutex<Vec<(u64, Option<u64>)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let on_progress: ProgressFn = Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        });

        let data = Bytes::from(vec![0u8; PROGRESS_CHUNK_BYTES + 100]);
        let chunks: Vec<_> = progress_stream(data, on_progress).collect().await;

        assert_eq!(chunks.len(), 2);
        let total = (PROGRESS_CHUNK_BYTES + 100) as u64;
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                (PROGRESS_CHUNK_BYTES as u64, Some(total)),
                (total, Some(total)),
            ]
        );
    }

    #[tokio::test]
    async fn test_progress_stream_empty_input() {
        let on_progress: ProgressFn = Arc::new(|_, _| panic!("no events expected"));
        let chunks: Vec<_> = progress_stream(Bytes::new(), on_progress).collect().await;
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
