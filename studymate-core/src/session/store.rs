//! Transcript data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery state of a message.
///
/// User messages start `Pending` and settle to `Sent` or `Failed`; they are
/// never removed from the transcript when their turn fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique within a session
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Display-only
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl ChatMessage {
    /// Create a message that is already delivered
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            status: DeliveryStatus::Sent,
        }
    }

    /// Create a user message awaiting its reply
    pub fn pending(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Pending,
            ..Self::new(id, Role::User, content)
        }
    }

    /// Role and content only, as sent to the backend
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

/// One `chat_history` item on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Hands out message ids of the form `<unix-millis>-<sequence>`
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    sequence: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().timestamp_millis(), seq)
    }
}

/// Ordered, append-only list of messages for the current session
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Update the delivery status of a message. Returns false if the id is gone.
    pub fn set_status(&mut self, id: &str, status: DeliveryStatus) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    /// Mark every pending message as failed, returning how many changed
    pub fn fail_pending(&mut self) -> usize {
        let mut changed = 0;
        for message in self
            .messages
            .iter_mut()
            .filter(|m| m.status == DeliveryStatus::Pending)
        {
            message.status = DeliveryStatus::Failed;
            changed += 1;
        }
        changed
    }

    /// Prior conversation in wire form, skipping system notes and failed turns
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System && m.status != DeliveryStatus::Failed)
            .map(ChatMessage::to_history_entry)
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let ids = MessageIdGenerator::new();
        let generated: Vec<String> = (0..100).map(|_| ids.next_id()).collect();

        let mut unique = generated.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 100);

        let sequences: Vec<u64> = generated
            .iter()
            .map(|id| id.rsplit('-').next().unwrap().parse().unwrap())
            .collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_transcript_keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::pending("1", "question"));
        transcript.push(ChatMessage::new("2", Role::Assistant, "answer"));
        transcript.push(ChatMessage::new("3", Role::System, "note"));

        let ids: Vec<&str> = transcript.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_set_status_and_fail_pending() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::pending("1", "a"));
        transcript.push(ChatMessage::pending("2", "b"));

        assert!(transcript.set_status("1", DeliveryStatus::Sent));
        assert!(!transcript.set_status("missing", DeliveryStatus::Sent));
        assert_eq!(transcript.fail_pending(), 1);
        assert_eq!(transcript.messages()[0].status, DeliveryStatus::Sent);
        assert_eq!(transcript.messages()[1].status, DeliveryStatus::Failed);
    }

    #[test]
    fn test_history_skips_system_and_failed() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::new("1", Role::System, "uploaded"));
        transcript.push(ChatMessage::new("2", Role::User, "hi"));
        transcript.push(ChatMessage::new("3", Role::Assistant, "hello"));
        let mut failed = ChatMessage::pending("4", "lost");
        failed.status = DeliveryStatus::Failed;
        transcript.push(failed);

        let history = transcript.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].content, "hello");
    }
}
