//! Storage traits.
//!
//! Backends are injected as trait objects so the conversation layer never
//! depends on where records live. The flat-file backend in [`crate::json`]
//! is the default; tests swap in seeded instances of the same type.

use async_trait::async_trait;

use docuchat_common::Result;

use crate::types::{ChatHistory, Meeting};

/// Read and mutate the meeting catalog.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// All meetings, in stored order.
    async fn list_meetings(&self) -> Result<Vec<Meeting>>;

    /// Look up one meeting by id. Returns `Ok(None)` when the id is unknown.
    async fn get_meeting(&self, id: u64) -> Result<Option<Meeting>>;

    /// Record a new cached-content handle for a meeting and return the
    /// updated catalog. Fails with `MeetingNotFound` for unknown ids.
    async fn set_cache_name(&self, id: u64, cache_name: &str) -> Result<Vec<Meeting>>;
}

/// Read and append per-meeting chat history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Full history for a meeting. A meeting with no recorded history yields
    /// an empty list, never an error.
    async fn get_history(&self, meeting_id: u64) -> Result<ChatHistory>;

    /// Merge a user message into the history and return the merged view.
    ///
    /// When the last persisted turn is already a user turn, its text is
    /// overwritten in the returned history but NOT persisted; the merged
    /// text only reaches disk once the model reply is appended. A fresh
    /// user turn is appended and persisted immediately.
    async fn append_user_turn(&self, meeting_id: u64, text: &str) -> Result<ChatHistory>;

    /// Append a model reply to the persisted history and persist the result.
    ///
    /// Re-reads the stored history rather than trusting any in-memory view,
    /// so an overwritten-but-unpersisted user turn stays unpersisted.
    async fn append_model_turn(&self, meeting_id: u64, text: &str) -> Result<ChatHistory>;
}

/// Read meeting transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Raw transcript text for a meeting. Missing transcripts are an error.
    async fn get_transcript(&self, meeting_id: u64) -> Result<String>;
}
