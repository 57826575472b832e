//! Model provider abstraction.
//!
//! Provides a unified interface for generating structured replies against a
//! server-side context cache and for managing the caches themselves. The
//! conversation layer only sees [`ModelProvider`]; the Gemini REST client in
//! [`gemini`] is the production implementation.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use docuchat_store::ChatHistory;

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for cache-backed model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Generate a reply for the given request and return the raw text.
    ///
    /// An empty string means the model produced no text; callers decide how
    /// to treat that.
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError>;

    /// Create a context cache and return its server-side record.
    async fn create_cache(
        &self,
        request: &CreateCacheRequest,
    ) -> Result<CachedContent, ProviderError>;

    /// Fetch an existing context cache by its fully qualified name.
    async fn get_cache(&self, name: &str) -> Result<CachedContent, ProviderError>;

    /// List all context caches owned by this API key.
    async fn list_caches(&self) -> Result<Vec<CachedContent>, ProviderError>;
}

/// Error code Gemini uses for an expired or deleted context cache.
const CACHE_NOT_FOUND_CODE: u16 = 403;

/// Exact message accompanying [`CACHE_NOT_FOUND_CODE`] for a missing cache.
const CACHE_NOT_FOUND_MESSAGE: &str = "CachedContent not found (or permission denied)";

/// Error from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Remote API returned an error payload
    #[error("API error ({code} {status}): {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    /// Transport failure before a response arrived
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether the remote reported the referenced context cache as missing.
    ///
    /// Gemini signals an expired or deleted cache with a 403 carrying one
    /// specific message. Any other failure (quota, auth, transport) must not
    /// be mistaken for a recoverable cache miss.
    pub fn is_cache_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api { code, message, .. }
                if *code == CACHE_NOT_FOUND_CODE && message == CACHE_NOT_FOUND_MESSAGE
        )
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A generation request against a context cache.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Conversation turns sent alongside the cached context
    pub contents: ChatHistory,
    /// Fully qualified cache handle (`cachedContents/<id>`)
    pub cached_content: String,
    /// MIME type the model must respond with
    pub response_mime_type: String,
    /// Schema constraining the response shape
    pub response_schema: serde_json::Value,
}

impl GenerateRequest {
    /// Build a structured-output request: JSON constrained by `schema`.
    pub fn structured(
        contents: ChatHistory,
        cached_content: impl Into<String>,
        schema: serde_json::Value,
    ) -> Self {
        Self {
            contents,
            cached_content: cached_content.into(),
            response_mime_type: "application/json".into(),
            response_schema: schema,
        }
    }
}

/// Parameters for creating a context cache.
#[derive(Debug, Clone)]
pub struct CreateCacheRequest {
    /// Human-readable label (`session_<meeting id>`)
    pub display_name: String,
    /// System prompt baked into the cache
    pub system_instruction: String,
    /// Documents to cache, one user turn each
    pub contents: Vec<String>,
    /// Cache lifetime in seconds
    pub ttl_secs: u64,
}

/// Server-side record of a context cache.
///
/// Field names follow the Gemini wire format so this type deserializes API
/// responses directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedContent {
    /// Server-assigned handle (`cachedContents/<id>`)
    pub name: String,

    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(rename = "createTime", default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(rename = "expireTime", default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(code: u16, message: &str) -> ProviderError {
        ProviderError::Api {
            code,
            status: "PERMISSION_DENIED".into(),
            message: message.into(),
        }
    }

    #[test]
    fn cache_not_found_requires_exact_signature() {
        assert!(api_error(403, CACHE_NOT_FOUND_MESSAGE).is_cache_not_found());
        assert!(!api_error(404, CACHE_NOT_FOUND_MESSAGE).is_cache_not_found());
        assert!(!api_error(403, "Permission denied on resource").is_cache_not_found());

        let decode: ProviderError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(!decode.is_cache_not_found());
    }

    #[test]
    fn structured_request_uses_json_mime() {
        let request = GenerateRequest::structured(vec![], "cachedContents/abc", json!({}));
        assert_eq!(request.response_mime_type, "application/json");
        assert_eq!(request.cached_content, "cachedContents/abc");
    }

    #[test]
    fn cached_content_wire_shape() {
        let cache: CachedContent = serde_json::from_value(json!({
            "name": "cachedContents/abc123",
            "displayName": "session_1",
            "model": "models/gemini-2.5-flash",
            "createTime": "2025-01-01T00:00:00Z",
            "expireTime": "2025-01-01T01:00:00Z"
        }))
        .unwrap();

        assert_eq!(cache.name, "cachedContents/abc123");
        assert_eq!(cache.display_name.as_deref(), Some("session_1"));

        // Unset optional fields are omitted on the way out.
        let minimal = CachedContent {
            name: "cachedContents/x".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&minimal).unwrap();
        assert_eq!(json, json!({"name": "cachedContents/x"}));
    }

    #[test]
    fn api_error_display() {
        let err = api_error(403, "CachedContent not found (or permission denied)");
        assert_eq!(
            err.to_string(),
            "API error (403 PERMISSION_DENIED): CachedContent not found (or permission denied)"
        );
    }
}
