//! Flat-file JSON storage.
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   meetings.json       catalog of meetings
//!   chats_<id>.json     per-meeting chat history
//!   meeting_<id>.txt    per-meeting transcript
//! ```
//!
//! Writes are whole-file replacements; there is no partial update.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use docuchat_common::{Error, Result, ResultExt};

use crate::traits::{HistoryStore, MeetingStore, TranscriptStore};
use crate::types::{ChatHistory, ChatTurn, Meeting, Part, Role};

/// JSON flat-file backend for meetings, histories, and transcripts.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .context(format!("creating data directory {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn meetings_path(&self) -> PathBuf {
        self.data_dir.join("meetings.json")
    }

    fn history_path(&self, meeting_id: u64) -> PathBuf {
        self.data_dir.join(format!("chats_{meeting_id}.json"))
    }

    fn transcript_path(&self, meeting_id: u64) -> PathBuf {
        self.data_dir.join(format!("meeting_{meeting_id}.txt"))
    }

    fn read_meetings(&self) -> Result<Vec<Meeting>> {
        let path = self.meetings_path();
        let raw = fs::read_to_string(&path)
            .context(format!("loading meetings from {}", path.display()))?;
        let meetings =
            serde_json::from_str(&raw).context(format!("parsing {}", path.display()))?;
        Ok(meetings)
    }

    fn write_meetings(&self, meetings: &[Meeting]) -> Result<()> {
        let path = self.meetings_path();
        let raw = serde_json::to_string(meetings)?;
        fs::write(&path, raw).context(format!("writing meetings to {}", path.display()))?;
        Ok(())
    }

    fn read_history(&self, meeting_id: u64) -> Result<ChatHistory> {
        let path = self.history_path(meeting_id);
        if !path.exists() {
            tracing::warn!(meeting_id, "no chat history on disk, starting empty");
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .context(format!("loading chat history from {}", path.display()))?;
        let history =
            serde_json::from_str(&raw).context(format!("parsing {}", path.display()))?;
        Ok(history)
    }

    fn write_history(&self, meeting_id: u64, history: &ChatHistory) -> Result<()> {
        let path = self.history_path(meeting_id);
        let raw = serde_json::to_string(history)?;
        fs::write(&path, raw)
            .context(format!("writing chat history to {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl MeetingStore for JsonFileStore {
    async fn list_meetings(&self) -> Result<Vec<Meeting>> {
        self.read_meetings()
    }

    async fn get_meeting(&self, id: u64) -> Result<Option<Meeting>> {
        let meetings = self.read_meetings()?;
        Ok(meetings.into_iter().find(|m| m.id == id))
    }

    async fn set_cache_name(&self, id: u64, cache_name: &str) -> Result<Vec<Meeting>> {
        let mut meetings = self.read_meetings()?;
        let meeting = meetings
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(Error::MeetingNotFound(id))?;
        meeting.cached_content_name = cache_name.to_string();
        self.write_meetings(&meetings)?;
        tracing::debug!(meeting_id = id, cache_name, "recorded cached content name");
        Ok(meetings)
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn get_history(&self, meeting_id: u64) -> Result<ChatHistory> {
        self.read_history(meeting_id)
    }

    async fn append_user_turn(&self, meeting_id: u64, text: &str) -> Result<ChatHistory> {
        let mut history = self.read_history(meeting_id)?;

        if let Some(last) = history.last_mut() {
            if last.role == Role::User {
                // The overwrite path does not persist; the merged text reaches
                // disk only when the model reply is appended.
                match last.parts.first_mut() {
                    Some(part) => part.text = text.to_string(),
                    None => last.parts.push(Part {
                        text: text.to_string(),
                    }),
                }
                return Ok(history);
            }
        }

        history.push(ChatTurn::user(text));
        self.write_history(meeting_id, &history)?;
        Ok(history)
    }

    async fn append_model_turn(&self, meeting_id: u64, text: &str) -> Result<ChatHistory> {
        // Fresh read so only persisted turns are extended.
        let mut history = self.read_history(meeting_id)?;
        history.push(ChatTurn::model(text));
        self.write_history(meeting_id, &history)?;
        Ok(history)
    }
}

#[async_trait]
impl TranscriptStore for JsonFileStore {
    async fn get_transcript(&self, meeting_id: u64) -> Result<String> {
        let path = self.transcript_path(meeting_id);
        let transcript = fs::read_to_string(&path)
            .context(format!("loading transcript from {}", path.display()))?;
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn seed_meetings(store: &JsonFileStore, meetings: &[Meeting]) {
        store.write_meetings(meetings).unwrap();
    }

    fn meeting(id: u64, title: &str) -> Meeting {
        Meeting {
            id,
            title: title.to_string(),
            cached_content_name: String::new(),
        }
    }

    #[tokio::test]
    async fn missing_history_is_empty() {
        let (_dir, store) = setup();
        let history = store.get_history(42).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn user_turn_is_appended_and_persisted() {
        let (_dir, store) = setup();

        let history = store.append_user_turn(1, "first question").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);

        let reread = store.get_history(1).await.unwrap();
        assert_eq!(reread, history);
    }

    #[tokio::test]
    async fn consecutive_user_turns_overwrite_without_persisting() {
        let (_dir, store) = setup();

        store.append_user_turn(1, "old text").await.unwrap();
        let merged = store.append_user_turn(1, "new text").await.unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text(), "new text");

        // Disk still holds the original turn.
        let on_disk = store.get_history(1).await.unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].text(), "old text");
    }

    #[tokio::test]
    async fn model_turn_follows_user_turn() {
        let (_dir, store) = setup();

        store.append_user_turn(1, "question").await.unwrap();
        let history = store.append_model_turn(1, "answer").await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Model);
        assert_eq!(history[1].text(), "answer");

        let reread = store.get_history(1).await.unwrap();
        assert_eq!(reread, history);
    }

    #[tokio::test]
    async fn model_turn_extends_persisted_history_only() {
        let (_dir, store) = setup();

        store.append_user_turn(1, "persisted").await.unwrap();
        // Overwrite in memory; disk still says "persisted".
        store.append_user_turn(1, "ephemeral").await.unwrap();

        let history = store.append_model_turn(1, "reply").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text(), "persisted");
    }

    #[tokio::test]
    async fn list_meetings_without_catalog_fails() {
        let (_dir, store) = setup();
        assert!(store.list_meetings().await.is_err());
    }

    #[tokio::test]
    async fn get_meeting_by_id() {
        let (_dir, store) = setup();
        seed_meetings(&store, &[meeting(3, "Standup"), meeting(7, "Retro")]);

        let found = store.get_meeting(7).await.unwrap();
        assert_eq!(found.unwrap().title, "Retro");

        let missing = store.get_meeting(5).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn set_cache_name_targets_record_by_id() {
        let (_dir, store) = setup();
        // Sparse, out-of-order ids: lookup must match on the id field.
        seed_meetings(&store, &[meeting(7, "Retro"), meeting(3, "Standup")]);

        let updated = store
            .set_cache_name(3, "cachedContents/abc")
            .await
            .unwrap();

        let retro = updated.iter().find(|m| m.id == 7).unwrap();
        let standup = updated.iter().find(|m| m.id == 3).unwrap();
        assert!(retro.cached_content_name.is_empty());
        assert_eq!(standup.cached_content_name, "cachedContents/abc");

        let reread = store.list_meetings().await.unwrap();
        assert_eq!(reread, updated);
    }

    #[tokio::test]
    async fn set_cache_name_unknown_meeting() {
        let (_dir, store) = setup();
        seed_meetings(&store, &[meeting(1, "Standup")]);

        let err = store.set_cache_name(9, "cachedContents/x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn transcript_round_trip() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("meeting_4.txt"), "Alice: hello\n").unwrap();

        let transcript = store.get_transcript(4).await.unwrap();
        assert_eq!(transcript, "Alice: hello\n");

        assert!(store.get_transcript(5).await.is_err());
    }
}
