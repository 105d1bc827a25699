#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Shown in place of the list when the history request fails.
pub const FETCH_ERROR_MESSAGE: &str = "메시지를 불러오지 못했습니다. 창을 닫았다가 다시 열어 주세요.";

/// State for the chat widget.
///
/// Owned by the controller; the view receives snapshots through an
/// `RwSignal<ChatState>` provided via context.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatState {
    pub is_open: bool,
    /// While set, `messages` is not authoritative and is not rendered.
    pub is_loading: bool,
    /// User-facing fetch failure. Blocks input until the widget is reopened.
    pub error: Option<String>,
    /// Ascending by timestamp; each logical message at most once.
    pub messages: Vec<ChatMessage>,
    pub draft: String,
}

impl Default for ChatState {
    fn default() -> Self {
        Self { is_open: false, is_loading: true, error: None, messages: Vec::new(), draft: String::new() }
    }
}

impl ChatState {
    /// Input and submit are usable: history is loaded and no error is showing.
    pub fn input_enabled(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }

    /// Whether the same logical message is already visible.
    pub fn contains(&self, msg: &ChatMessage) -> bool {
        self.messages.iter().any(|m| m.is_same_message(msg))
    }

    /// Insert a message delivered by the realtime feed.
    ///
    /// Returns `false` (and leaves the list untouched) for a duplicate. New
    /// entries go after every message with an equal or earlier timestamp, so
    /// in-order delivery is a plain append.
    pub fn insert_remote(&mut self, msg: ChatMessage) -> bool {
        if self.contains(&msg) {
            return false;
        }
        let at = self.messages.partition_point(|m| m.timestamp <= msg.timestamp);
        self.messages.insert(at, msg);
        true
    }

    /// Replace the list with a freshly fetched history.
    pub fn apply_history(&mut self, history: Vec<ChatMessage>) {
        let mut messages: Vec<ChatMessage> = Vec::with_capacity(history.len());
        for msg in history {
            if !messages.iter().any(|m| m.is_same_message(&msg)) {
                messages.push(msg);
            }
        }
        messages.sort_by_key(|m| m.timestamp);

        self.messages = messages;
        self.is_loading = false;
        self.error = None;
    }

    /// Record a failed history fetch.
    pub fn apply_fetch_error(&mut self, message: impl Into<String>) {
        self.messages.clear();
        self.is_loading = false;
        self.error = Some(message.into());
    }
}

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Wire value of the `sender` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single persisted chat message.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    /// Assigned by the remote store; `None` until persisted.
    pub id: Option<String>,
    pub text: String,
    pub sender: Sender,
    pub timestamp: OffsetDateTime,
}

impl ChatMessage {
    /// Identity used for deduplication.
    ///
    /// Ids decide when both sides have one; otherwise the
    /// `(sender, text, timestamp)` triple does.
    pub fn is_same_message(&self, other: &ChatMessage) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.sender == other.sender && self.text == other.text && self.timestamp == other.timestamp,
        }
    }
}
