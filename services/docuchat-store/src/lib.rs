//! DocuChat Store - Meeting, chat history, and transcript storage.
//!
//! This crate provides the storage layer for DocuChat:
//! - Domain types (`Meeting`, `ChatTurn`) shared with the provider wire format
//! - Store traits (`MeetingStore`, `HistoryStore`, `TranscriptStore`)
//! - A flat-file JSON backend (`JsonFileStore`)
//!
//! Records are whole-blob snapshots: every write replaces the full file.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod json;
pub mod traits;
pub mod types;

pub use json::JsonFileStore;
pub use traits::{HistoryStore, MeetingStore, TranscriptStore};
pub use types::{ChatHistory, ChatTurn, Meeting, Part, Role};
