//! Client for the generative text/vision API
//!
//! Builds multi-part prompts (interleaved text and inline images), calls the
//! remote `generateContent` endpoint through the backoff retrier, and
//! normalizes the response down to the generated text. The API credential is
//! resolved once at construction; there is no ambient credential lookup at
//! call time.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{AtriumError, Result};

/// Per-attempt request timeout for generation calls
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for inlining attachment/image content
const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One element of a prompt. Order is preserved and meaningful: question
/// text, its image, then the answer, in sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Inline binary content, base64-encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_image(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: base64_data.into(),
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: &'a [Part],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Extract the first usable text from a generation response
fn extract_text(response: GenerateResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Text generation seam, implemented by [`AiClient`] and by test doubles
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, parts: &[Part], system_instruction: Option<&str>) -> Result<String>;
}

/// Binary fetch seam for inlining attachment content into prompts
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch a URL and return its content base64-encoded. Failures return
    /// `None`: callers skip the visual and continue text-only.
    async fn fetch_base64(&self, url: &str) -> Option<String>;
}

/// Configuration for [`AiClient`]
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub retry: RetryPolicy,
}

/// HTTP client for the generative API
pub struct AiClient {
    http: reqwest::Client,
    config: AiClientConfig,
}

impl AiClient {
    pub fn new(config: AiClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }

    /// Classify a transport failure so the retrier sees timeouts and resets
    /// as transient.
    fn map_transport_error(e: reqwest::Error) -> AtriumError {
        if e.is_timeout() {
            AtriumError::Timeout
        } else if e.is_connect() {
            AtriumError::ConnectionReset
        } else {
            AtriumError::Http(e)
        }
    }

    async fn call_once(&self, parts: &[Part], system_instruction: Option<&str>) -> Result<String> {
        let instruction_parts = system_instruction.map(|text| [Part::text(text)]);
        let request = GenerateRequest {
            contents: [Content { parts }],
            system_instruction: instruction_parts.as_ref().map(|parts| Content {
                parts: parts.as_slice(),
            }),
        };

        let response = self
            .http
            .post(self.generate_url())
            .timeout(GENERATE_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AtriumError::RemoteStatus(status.as_u16()));
        }

        let body: GenerateResponse = response.json().await.map_err(Self::map_transport_error)?;
        extract_text(body).ok_or(AtriumError::EmptyResponse)
    }
}

#[async_trait]
impl TextGenerator for AiClient {
    async fn generate(&self, parts: &[Part], system_instruction: Option<&str>) -> Result<String> {
        debug!(parts = parts.len(), "calling generative API");
        retry_with_backoff(self.config.retry, || {
            self.call_once(parts, system_instruction)
        })
        .await
    }
}

#[async_trait]
impl MediaFetcher for AiClient {
    async fn fetch_base64(&self, url: &str) -> Option<String> {
        let result = async {
            let response = self
                .http
                .get(url)
                .timeout(IMAGE_FETCH_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>(base64::engine::general_purpose::STANDARD.encode(&bytes))
        }
        .await;

        match result {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(url, error = %e, "image fetch failed, continuing without it");
                None
            }
        }
    }
}
