use super::sse::{SseEvent, SseParser};
use super::{API_BASE, request, response};
use derive_new::new;
use derive_setters::Setters;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc::{Sender, channel};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Buffered fragments between the body reader task and the consumer.
const STREAM_CHANNEL_CAPACITY: usize = 64;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum Error {
    #[error("api returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone, new, Setters)]
#[setters(prefix = "with_", into, strip_option)]
pub struct Client {
    #[setters(skip)]
    #[new(into)]
    api_key: String,
    #[setters(skip)]
    #[new(into)]
    model: String,
    #[new(value = "API_BASE.to_string()")]
    api_base: String,
    #[new(value = "reqwest::Client::new()")]
    client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Client {
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{api_base}/{model}:{method}",
            api_base = self.api_base.trim_end_matches('/'),
            model = self.model,
        )
    }

    async fn post(
        &self,
        url: &str,
        request: &request::Request,
    ) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::USER_AGENT, env!("CARGO_CRATE_NAME"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(model = %self.model, %status, "response received");
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            let body = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            warn!(model = %self.model, %status, "request rejected");
            return Err(Error::Api { status, body });
        }

        Ok(response)
    }

    pub async fn generate_content(
        &self,
        request: request::Request,
    ) -> Result<response::Response, Error> {
        let url = self.endpoint("generateContent");
        let response = self.post(&url, &request).await?;
        Ok(response.json().await?)
    }

    /// Start a streamed generation.
    ///
    /// The HTTP status is checked before the stream is returned, so a rejected
    /// request (bad key, unknown model) surfaces here and never as a stream item.
    /// The stream ends after the first error it yields.
    pub async fn stream_content(
        &self,
        request: request::Request,
    ) -> Result<impl tokio_stream::Stream<Item = Result<response::Response, Error>>, Error> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &request).await?;

        let (tx, rx) = channel(STREAM_CHANNEL_CAPACITY);
        let body = response.bytes_stream();
        tokio::spawn(async move {
            let mut body = std::pin::pin!(body);
            let mut parser = SseParser::new();
            while let Some(chunk) = body.next().await {
                let events = match chunk {
                    Ok(bytes) => parser.push(&bytes),
                    Err(e) => {
                        let _ = tx.send(Err(Error::from(e))).await;
                        return;
                    }
                };
                if !forward(&tx, events).await {
                    return;
                }
            }
            forward(&tx, parser.finish()).await;
        });

        Ok(ReceiverStream::new(rx))
    }
}

/// Decode and send each event; returns `false` once the stream should stop.
async fn forward(
    tx: &Sender<Result<response::Response, Error>>,
    events: Vec<SseEvent>,
) -> bool {
    for event in events {
        if event.is_done() || event.data.trim().is_empty() {
            continue;
        }
        debug!(bytes = event.data.len(), "stream event");
        match serde_json::from_str::<response::Response>(&event.data) {
            Ok(fragment) => {
                if tx.send(Ok(fragment)).await.is_err() {
                    return false;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(Error::from(e))).await;
                return false;
            }
        }
    }
    true
}
