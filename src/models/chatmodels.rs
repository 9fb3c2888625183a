// models/chatmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

/// Attachment MIME subtypes the portal accepts.
pub const ALLOWED_ATTACHMENT_TYPES: [&str; 9] =
    ["jpeg", "png", "jpg", "gif", "bmp", "webp", "pdf", "heic", "heif"];

/// 2 MiB ceiling, enforced before any upload starts.
pub const MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    #[serde(deserialize_with = "super::documentmodel::flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "super::documentmodel::flexible_id")]
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// A locally-constructed message awaiting server confirmation. The id
    /// is timestamp-based so pending entries sort alongside real ones.
    pub fn local(user_id: &str, body: &str, file: Option<String>) -> Self {
        let now = Utc::now();
        ChatMessage {
            id: format!("local-{}-{}", now.timestamp_millis(), Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            message: body.to_string(),
            file,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Client-side gate run before any network call is made.
    pub fn validate(&self) -> Result<(), ClientError> {
        let subtype = self
            .mime_type
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if !ALLOWED_ATTACHMENT_TYPES.contains(&subtype.as_str()) {
            return Err(ClientError::Validation(format!(
                "File type '{}' is not allowed. Allowed types: jpeg, png, jpg, gif, bmp, webp, pdf, heic, heif",
                self.mime_type
            )));
        }
        if self.bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(ClientError::Validation(
                "File is too large. Maximum size is 2MB".to_string(),
            ));
        }
        Ok(())
    }
}

/// Delivery state of one thread entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub message: ChatMessage,
    pub delivery: Delivery,
}

/// The document's discussion thread.
///
/// Invariants maintained after every mutation:
/// - entries are sorted ascending by `created_at`;
/// - no two entries share a message id (realtime duplicates are dropped).
#[derive(Debug, Default)]
pub struct ChatThread {
    entries: Vec<ThreadEntry>,
}

impl ChatThread {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[ThreadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the thread with a fresh server page set. Unconfirmed local
    /// entries are dropped; the server copy is authoritative.
    pub fn replace_all(&mut self, messages: Vec<ChatMessage>) {
        self.entries = messages
            .into_iter()
            .map(|message| ThreadEntry { message, delivery: Delivery::Confirmed })
            .collect();
        self.dedup_and_sort();
    }

    /// Merge an older page fetched through pagination.
    pub fn merge_page(&mut self, messages: Vec<ChatMessage>) {
        for message in messages {
            if !self.contains(&message.id) {
                self.entries.push(ThreadEntry { message, delivery: Delivery::Confirmed });
            }
        }
        self.sort();
    }

    /// Apply a realtime delivery. Returns false when the id was already
    /// present and the event was dropped.
    pub fn apply_inbound(&mut self, message: ChatMessage) -> bool {
        if self.contains(&message.id) {
            return false;
        }
        self.entries.push(ThreadEntry { message, delivery: Delivery::Confirmed });
        self.sort();
        true
    }

    /// Optimistically insert a locally-constructed pending message.
    pub fn push_pending(&mut self, message: ChatMessage) {
        self.entries.push(ThreadEntry { message, delivery: Delivery::Pending });
        self.sort();
    }

    /// Record that the send behind a pending entry failed. The entry stays
    /// visible so the user can retry, but is never mistaken for delivered.
    pub fn mark_failed(&mut self, message_id: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.message.id == message_id) {
            entry.delivery = Delivery::Failed;
        }
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.entries.iter().any(|e| e.message.id == message_id)
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
    }

    fn dedup_and_sort(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.entries.retain(|e| seen.insert(e.message.id.clone()));
        self.sort();
    }
}
