//! Google Gemini REST client with explicit context-cache management.
//!
//! Talks to the `v1beta` API directly:
//! - `models/<model>:generateContent` referencing a `cachedContent` handle
//! - `cachedContents` create/get/list for the caches themselves

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use docuchat_store::{ChatTurn, Part};

use super::{CachedContent, CreateCacheRequest, GenerateRequest, ModelProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct WireGenerateRequest<'a> {
    contents: &'a [ChatTurn],
    #[serde(rename = "cachedContent")]
    cached_content: &'a str,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct WireGenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireCreateCacheRequest<'a> {
    model: &'a str,
    #[serde(rename = "displayName")]
    display_name: &'a str,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
    contents: Vec<ChatTurn>,
    ttl: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct ListCachedContentsResponse {
    #[serde(rename = "cachedContents", default)]
    cached_contents: Vec<CachedContent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Error envelope Gemini wraps around non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u16,
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiClient {
    /// Create a client for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a client pointed at a custom API root. Tests use this to talk
    /// to a local mock server.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: api_key.into(),
            model: model.into(),
            base_url,
        }
    }

    /// Fully qualified model path (`models/<name>`).
    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// Map a non-2xx response to a structured [`ProviderError`].
    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) => ProviderError::Api {
                code: envelope.error.code,
                status: envelope.error.status,
                message: envelope.error.message,
            },
            // Not the standard envelope; keep the raw body as the message.
            Err(_) => ProviderError::Api {
                code: status.as_u16(),
                status: status.canonical_reason().unwrap_or("UNKNOWN").to_string(),
                message: body,
            },
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            self.model_path(),
            self.api_key
        );

        let wire = WireGenerateRequest {
            contents: &request.contents,
            cached_content: &request.cached_content,
            generation_config: WireGenerationConfig {
                response_mime_type: &request.response_mime_type,
                response_schema: &request.response_schema,
            },
        };

        tracing::debug!(
            cached_content = %request.cached_content,
            turns = request.contents.len(),
            "calling generateContent"
        );

        let response = self.client.post(&url).json(&wire).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        let result: GenerateContentResponse = serde_json::from_str(&body)?;

        // A blocked or empty completion comes back without candidates; the
        // caller decides how to treat empty text.
        let text = match result.candidates.and_then(|c| c.into_iter().next()) {
            Some(candidate) => {
                tracing::debug!(
                    finish_reason = candidate.finish_reason.as_deref(),
                    "generateContent completed"
                );
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            }
            None => {
                tracing::debug!("generateContent returned no candidates");
                String::new()
            }
        };

        Ok(text)
    }

    async fn create_cache(
        &self,
        request: &CreateCacheRequest,
    ) -> Result<CachedContent, ProviderError> {
        let url = format!("{}/cachedContents?key={}", self.base_url, self.api_key);

        let model = self.model_path();
        let wire = WireCreateCacheRequest {
            model: &model,
            display_name: &request.display_name,
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: request
                .contents
                .iter()
                .map(|text| ChatTurn::user(text.clone()))
                .collect(),
            ttl: format!("{}s", request.ttl_secs),
        };

        tracing::info!(display_name = %request.display_name, "creating cached content");

        let response = self.client.post(&url).json(&wire).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        let cache: CachedContent = serde_json::from_str(&body)?;
        Ok(cache)
    }

    async fn get_cache(&self, name: &str) -> Result<CachedContent, ProviderError> {
        // `name` is already fully qualified (`cachedContents/<id>`).
        let url = format!("{}/{}?key={}", self.base_url, name, self.api_key);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        let cache: CachedContent = serde_json::from_str(&body)?;
        Ok(cache)
    }

    async fn list_caches(&self) -> Result<Vec<CachedContent>, ProviderError> {
        let mut caches = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}/cachedContents?key={}", self.base_url, self.api_key);
            if let Some(ref token) = page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(Self::error_from_response(response).await);
            }

            let body = response.text().await?;
            let page: ListCachedContentsResponse = serde_json::from_str(&body)?;
            caches.extend(page.cached_contents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(caches)
    }
}
