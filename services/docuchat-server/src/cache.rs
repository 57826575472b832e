//! Context cache lifecycle.
//!
//! Gemini context caches expire server-side (TTL driven), so every
//! conversation request has to re-establish a usable cache before invoking
//! the model. [`CacheManager::resolve`] owns that policy.

use std::sync::Arc;

use docuchat_common::{Error, Result};
use docuchat_store::{Meeting, MeetingStore, TranscriptStore};

use crate::provider::{CachedContent, CreateCacheRequest, ModelProvider};

/// System prompt baked into every meeting cache.
const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant answering questions about these meetings.";

/// Resolves and (re)creates per-meeting context caches.
pub struct CacheManager {
    provider: Arc<dyn ModelProvider>,
    meetings: Arc<dyn MeetingStore>,
    transcripts: Arc<dyn TranscriptStore>,
    ttl_secs: u64,
}

impl CacheManager {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        meetings: Arc<dyn MeetingStore>,
        transcripts: Arc<dyn TranscriptStore>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            provider,
            meetings,
            transcripts,
            ttl_secs,
        }
    }

    /// Display name attached to a meeting's cache.
    fn display_name(meeting_id: u64) -> String {
        format!("session_{meeting_id}")
    }

    /// Return a usable context cache for the meeting.
    ///
    /// A missing handle creates a cache outright. A stored handle is looked
    /// up remotely; if the remote reports it gone (expired or evicted), a
    /// replacement is created transparently and the meeting record updated.
    /// Any other remote failure fails closed as `CacheUnavailable` so
    /// ambiguous errors cannot spawn new billable caches. A handle with no
    /// name is rejected whichever path produced it.
    pub async fn resolve(&self, meeting: &Meeting) -> Result<CachedContent> {
        let cache = if !meeting.has_cache() {
            tracing::info!(meeting_id = meeting.id, "no cache on record, creating");
            self.create(meeting.id).await?
        } else {
            match self.provider.get_cache(&meeting.cached_content_name).await {
                Ok(cache) => {
                    tracing::debug!(
                        meeting_id = meeting.id,
                        cache_name = %cache.name,
                        "reusing cached content"
                    );
                    cache
                }
                Err(err) if err.is_cache_not_found() => {
                    tracing::info!(
                        meeting_id = meeting.id,
                        cache_name = %meeting.cached_content_name,
                        "cache expired or evicted, creating replacement"
                    );
                    self.create(meeting.id).await?
                }
                Err(err) => {
                    tracing::warn!(
                        meeting_id = meeting.id,
                        cache_name = %meeting.cached_content_name,
                        error = %err,
                        "cache lookup failed"
                    );
                    return Err(Error::CacheUnavailable(err.to_string()));
                }
            }
        };

        if cache.name.is_empty() {
            return Err(Error::CacheUnavailable(
                "provider returned an unnamed cache".into(),
            ));
        }

        Ok(cache)
    }

    /// Create a fresh cache from the meeting transcript and record its handle.
    async fn create(&self, meeting_id: u64) -> Result<CachedContent> {
        let transcript = self.transcripts.get_transcript(meeting_id).await?;

        let request = CreateCacheRequest {
            display_name: Self::display_name(meeting_id),
            system_instruction: SYSTEM_INSTRUCTION.into(),
            contents: vec![transcript],
            ttl_secs: self.ttl_secs,
        };

        let cache = self
            .provider
            .create_cache(&request)
            .await
            .map_err(|e| Error::CacheUnavailable(e.to_string()))?;

        self.meetings.set_cache_name(meeting_id, &cache.name).await?;

        tracing::info!(
            meeting_id,
            cache_name = %cache.name,
            ttl_secs = self.ttl_secs,
            "created context cache"
        );

        Ok(cache)
    }
}
