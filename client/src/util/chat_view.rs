//! Pure view model for the chat widget.
//!
//! `ChatWidget` renders whatever `chat_body` returns; the priority between
//! loading, error, greeting, and list lives here so it can be tested without
//! a DOM.

#[cfg(test)]
#[path = "chat_view_test.rs"]
mod chat_view_test;

use time::{OffsetDateTime, UtcOffset};

use crate::state::chat::{ChatState, Sender};
use crate::util::time_format::clock_label;

pub const WIDGET_TITLE: &str = "고객 상담";
pub const LOADING_TEXT: &str = "메시지를 불러오는 중입니다...";
pub const GREETING_TEXT: &str = "안녕하세요! 무엇을 도와드릴까요?";
pub const INPUT_PLACEHOLDER: &str = "메시지를 입력하세요...";

/// Display name for a message author.
pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "나",
        Sender::Bot => "봇",
    }
}

/// One rendered row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLine {
    /// Stable key for keyed rendering.
    pub key: String,
    pub sender: Sender,
    pub label: &'static str,
    pub text: String,
    /// `HH:MM`, 24-hour.
    pub time: String,
}

/// What the message area shows, highest priority first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatBody {
    Loading,
    Failed(String),
    /// Empty history: a bot greeting stamped with the current time.
    Greeting(MessageLine),
    Messages(Vec<MessageLine>),
}

pub fn chat_body(state: &ChatState, now: OffsetDateTime, offset: UtcOffset) -> ChatBody {
    if state.is_loading {
        return ChatBody::Loading;
    }
    if let Some(error) = &state.error {
        return ChatBody::Failed(error.clone());
    }
    if state.messages.is_empty() {
        return ChatBody::Greeting(MessageLine {
            key: "greeting".to_owned(),
            sender: Sender::Bot,
            label: sender_label(Sender::Bot),
            text: GREETING_TEXT.to_owned(),
            time: clock_label(now, offset),
        });
    }
    let lines = state
        .messages
        .iter()
        .enumerate()
        .map(|(i, msg)| MessageLine {
            key: msg.id.clone().unwrap_or_else(|| format!("local-{i}")),
            sender: msg.sender,
            label: sender_label(msg.sender),
            text: msg.text.clone(),
            time: clock_label(msg.timestamp, offset),
        })
        .collect();
    ChatBody::Messages(lines)
}

/// What the scroll-to-bottom effect tracks. Draft edits leave it unchanged.
pub fn scroll_trigger(state: &ChatState) -> (bool, usize) {
    (state.is_open, state.messages.len())
}

/// Enter without Shift submits, but not while an IME composition is being
/// committed.
pub fn submits_on_key(key: &str, shift: bool, composing: bool) -> bool {
    key == "Enter" && !shift && !composing
}

/// The input box accepts typing.
pub fn can_edit(state: &ChatState) -> bool {
    state.input_enabled()
}

/// The submit button is enabled.
pub fn can_submit(state: &ChatState) -> bool {
    state.input_enabled() && !state.draft.trim().is_empty()
}

/// CSS modifier for a message bubble.
pub fn bubble_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "chat-widget__message chat-widget__message--user",
        Sender::Bot => "chat-widget__message chat-widget__message--bot",
    }
}
