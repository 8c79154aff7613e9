//! Gemini client for item identification with Maps grounding.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;

use shopseeker_core::{
    traits::ImageAnalyzer,
    types::{AnalysisResult, Coordinate, EncodedImage},
    Error, Result,
};

use crate::config::GeminiConfig;
use crate::wire::{Citation, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

/// Instruction sent alongside every image.
pub const INSTRUCTION: &str = "Identify exactly what this item is. Then, find shops within walking or short driving distance of my current location that sell this item or items very similar to it. Return a helpful description of the item and mention the best stores found.";

/// Description used when the service returns no text.
pub const FALLBACK_DESCRIPTION: &str = "I found this item, but couldn't generate a description.";

/// Analysis client backed by the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        // Fail on a bad model name now rather than on first search.
        config.generate_content_url()?;

        Ok(Self { http, config })
    }

    /// Model this client talks to.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiClient {
    #[tracing::instrument(skip_all, fields(model = %self.config.model))]
    async fn analyze(
        &self,
        image: &EncodedImage,
        coordinate: Option<Coordinate>,
    ) -> Result<AnalysisResult> {
        let url = self.config.generate_content_url()?;
        let body = GenerateContentRequest::new(image, INSTRUCTION, coordinate);

        tracing::debug!(
            media_type = %image.media_type(),
            encoded_len = image.encoded_len(),
            has_location = coordinate.is_some(),
            "Sending analysis request"
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::service_unavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::service_unavailable(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Analysis service returned an error");
            return Err(classify_failure(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| Error::invalid_response(format!("Malformed response: {}", e)))?;

        let result = normalize(parsed)?;
        tracing::info!(shops = result.shops.len(), "Analysis complete");
        Ok(result)
    }
}

/// Map a non-success status to the error taxonomy, keeping the service's message.
pub fn classify_failure(status: StatusCode, body: &str) -> Error {
    let error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = error
        .and_then(|e| {
            e.message
                .filter(|m| !m.trim().is_empty())
                .or(e.status.filter(|s| !s.trim().is_empty()))
        })
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Error::service_unavailable(message)
        }
        s if s.is_client_error() => Error::request_rejected(message),
        _ => Error::service_unavailable(message),
    }
}

/// Turn a raw response into the description and shop list.
pub fn normalize(response: GenerateContentResponse) -> Result<AnalysisResult> {
    let GenerateContentResponse {
        candidates,
        prompt_feedback,
    } = response;

    let Some(candidate) = candidates.into_iter().next() else {
        if let Some(reason) = prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            let detail = prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason_message.as_deref())
                .unwrap_or(reason);
            return Err(Error::request_rejected(format!("Request blocked: {}", detail)));
        }
        return Ok(AnalysisResult {
            description: FALLBACK_DESCRIPTION.to_string(),
            shops: Vec::new(),
        });
    };

    let finish_reason = candidate.finish_reason;
    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| part.thought != Some(true))
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let description = if text.trim().is_empty() {
        tracing::debug!(finish_reason = ?finish_reason, "No answer text; using fallback description");
        FALLBACK_DESCRIPTION.to_string()
    } else {
        text
    };

    let shops = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| match Citation::from(chunk) {
            Citation::Place(place) => place.into_shop(),
            Citation::Web { uri } => {
                tracing::debug!(uri = ?uri, "Web citation ignored");
                None
            }
            Citation::Unknown => None,
        })
        .collect();

    Ok(AnalysisResult { description, shops })
}
