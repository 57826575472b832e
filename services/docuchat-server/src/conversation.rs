//! Cache-backed conversation controller.
//!
//! One `send_message` call merges the user text into history, resolves the
//! meeting's context cache, invokes the model with the full history, records
//! the raw reply, and parses it into an [`EmailDraft`]. There is no state
//! between calls beyond what the stores persist.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use docuchat_common::{Error, Result};
use docuchat_store::{HistoryStore, MeetingStore};

use crate::cache::CacheManager;
use crate::provider::{GenerateRequest, ModelProvider};

/// Structured reply the model is asked to produce.
///
/// The same type drives the request-side response schema and the parse of
/// the reply text. Missing fields parse as empty strings; an empty draft is
/// a valid outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl EmailDraft {
    /// JSON schema sent as the generation `responseSchema`.
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "subject": {"type": "STRING"},
                "body": {"type": "STRING"}
            },
            "required": ["subject", "body"]
        })
    }

    /// Parse a model reply into a draft.
    ///
    /// Drafts are JSON objects on the wire. Serde's derived deserialization
    /// would also accept a positional array, so non-objects are rejected
    /// before conversion.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("reply is not a JSON object"));
        }
        serde_json::from_value(value)
    }
}

/// Orchestrates one conversation turn per call.
pub struct ConversationService {
    meetings: Arc<dyn MeetingStore>,
    history: Arc<dyn HistoryStore>,
    provider: Arc<dyn ModelProvider>,
    cache: CacheManager,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl ConversationService {
    pub fn new(
        meetings: Arc<dyn MeetingStore>,
        history: Arc<dyn HistoryStore>,
        provider: Arc<dyn ModelProvider>,
        cache: CacheManager,
    ) -> Self {
        Self {
            meetings,
            history,
            provider,
            cache,
            locks: DashMap::new(),
        }
    }

    /// Mutex scoping `send_message` to one in-flight call per meeting.
    ///
    /// Entries are never removed; the map grows with the number of distinct
    /// meetings seen.
    fn lock_for(&self, meeting_id: u64) -> Arc<Mutex<()>> {
        self.locks.entry(meeting_id).or_default().clone()
    }

    /// Run one conversation turn and return the parsed draft.
    pub async fn send_message(&self, meeting_id: u64, user_text: &str) -> Result<EmailDraft> {
        let lock = self.lock_for(meeting_id);
        let _guard = lock.lock().await;

        let meeting = self
            .meetings
            .get_meeting(meeting_id)
            .await?
            .ok_or(Error::MeetingNotFound(meeting_id))?;

        let history = self.history.append_user_turn(meeting_id, user_text).await?;

        let cache = self.cache.resolve(&meeting).await?;

        tracing::debug!(
            meeting_id,
            cache_name = %cache.name,
            turns = history.len(),
            "invoking model"
        );

        let request =
            GenerateRequest::structured(history, cache.name, EmailDraft::response_schema());
        let text = self
            .provider
            .generate(request)
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        if text.trim().is_empty() {
            tracing::warn!(meeting_id, "model returned no text");
            return Err(Error::EmptyResponse);
        }

        // The raw text is appended before parsing; invalid JSON still lands
        // in history.
        self.history.append_model_turn(meeting_id, &text).await?;

        EmailDraft::parse(&text).map_err(|e| {
            tracing::warn!(meeting_id, error = %e, "model reply did not match schema");
            Error::InvalidResponse(e.to_string())
        })
    }
}
