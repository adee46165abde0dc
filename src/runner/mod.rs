//! The request runner: one multimodal prompt (an app-icon image plus
//! instructions) streamed through `streamGenerateContent`, with every
//! fragment's text written out as it arrives.

use crate::config;
use crate::v1beta::request::{
    GenerationConfig, GoogleSearch, MediaResolution, Request, ThinkingConfig, ThinkingLevel, Tool,
};
use crate::v1beta::response::{FinishReason, UsageMetadata};
use crate::v1beta::{Content, Part, Role, rest};
use base64::{Engine as _, engine::general_purpose};
use derive_setters::Setters;
use std::io::Write;
use thiserror::Error;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

pub mod mime;

pub const IMAGE_MIME_TYPE: &str = "image/png";
/// Base64 of the 48x48 PNG sent with every request.
pub const IMAGE_BASE64: &str = include_str!("icon.png.b64");
pub const INSTRUCTION: &str = "make app icon";
/// Literal marker sent in the third part unless replaced with [`Runner::with_input`].
pub const INPUT_PLACEHOLDER: &str = "INSERT_INPUT_HERE";
pub const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Rest(#[from] rest::Error),
    #[error("invalid embedded image: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Decode the embedded image into an inline part.
///
/// A declared type that does not match the image header is logged, not rejected.
pub fn image_part() -> Result<Part, Error> {
    let bytes = general_purpose::STANDARD.decode(IMAGE_BASE64.trim())?;
    match mime::detect_image_mime(&bytes) {
        Some(detected) if detected == IMAGE_MIME_TYPE => {}
        detected => warn!(
            declared = IMAGE_MIME_TYPE,
            ?detected,
            "inline image does not match its declared mime type"
        ),
    }
    Ok(Part::inline(IMAGE_MIME_TYPE, bytes))
}

/// What a completed run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Fragments received from the stream.
    pub fragments: usize,
    /// Fragments that carried text and were written out.
    pub written: usize,
    pub bytes: usize,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_", into)]
pub struct Runner {
    #[setters(skip)]
    client: rest::Client,
    #[setters(skip)]
    image: Part,
    input: String,
    response_mime_type: String,
}

impl Runner {
    /// Bind a runner to `client`. The embedded image is decoded here, once.
    pub fn new(client: rest::Client) -> Result<Self, Error> {
        Ok(Self {
            client,
            image: image_part()?,
            input: INPUT_PLACEHOLDER.to_string(),
            response_mime_type: RESPONSE_MIME_TYPE.to_string(),
        })
    }

    /// The single user turn: image, instruction, input, in that order.
    pub fn contents(&self) -> Vec<Content> {
        vec![Content::new(
            Role::User,
            vec![
                self.image.clone(),
                Part::text(INSTRUCTION),
                Part::text(self.input.as_str()),
            ],
        )]
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::new()
            .with_thinking_config(ThinkingConfig::new().with_thinking_level(ThinkingLevel::High))
            .with_media_resolution(MediaResolution::High)
            .with_response_mime_type(self.response_mime_type.as_str())
    }

    pub fn tools(&self) -> Vec<Tool> {
        vec![Tool::GoogleSearch(GoogleSearch::default())]
    }

    pub fn request(&self) -> Request {
        Request::new(self.contents())
            .with_tools(self.tools())
            .with_generation_config(self.generation_config())
    }

    /// Stream the request and write each fragment's text to `out` as it arrives,
    /// with no separators. `out` is flushed after every fragment.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary, Error> {
        let request = self.request();
        info!(model = %self.client.model(), "streaming generation");

        let stream = self.client.stream_content(request).await?;
        let mut stream = std::pin::pin!(stream);
        let mut summary = RunSummary::default();

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            summary.fragments += 1;

            if let Some(text) = fragment.text() {
                out.write_all(text.as_bytes())?;
                out.flush()?;
                summary.written += 1;
                summary.bytes += text.len();
            } else {
                debug!(fragment = summary.fragments, "fragment without text");
            }

            if let Some(reason) = fragment.finish_reason() {
                summary.finish_reason = Some(reason.clone());
            }
            if fragment.usage_metadata.is_some() {
                summary.usage = fragment.usage_metadata;
            }
        }

        info!(
            fragments = summary.fragments,
            bytes = summary.bytes,
            finish_reason = ?summary.finish_reason,
            total_tokens = ?summary.usage.as_ref().and_then(|u| u.total_token_count),
            "stream finished"
        );
        Ok(summary)
    }
}
