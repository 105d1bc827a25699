use super::*;
use crate::state::chat::ChatMessage;
use time::macros::{datetime, offset};

fn loaded(messages: Vec<ChatMessage>) -> ChatState {
    ChatState { is_open: true, is_loading: false, error: None, messages, draft: String::new() }
}

fn bot_hi() -> ChatMessage {
    ChatMessage { id: Some("1".to_owned()), text: "hi".to_owned(), sender: Sender::Bot, timestamp: datetime!(2024-05-01 09:05 UTC) }
}

// =============================================================
// Body priority
// =============================================================

#[test]
fn loading_wins_over_everything() {
    let mut state = loaded(vec![bot_hi()]);
    state.is_loading = true;
    state.error = Some("x".to_owned());
    assert_eq!(chat_body(&state, datetime!(2024-05-01 10:00 UTC), offset!(UTC)), ChatBody::Loading);
}

#[test]
fn error_wins_over_messages() {
    let mut state = loaded(vec![bot_hi()]);
    state.error = Some("failed".to_owned());
    assert_eq!(chat_body(&state, datetime!(2024-05-01 10:00 UTC), offset!(UTC)), ChatBody::Failed("failed".to_owned()));
}

#[test]
fn empty_history_greets_with_current_time() {
    let body = chat_body(&loaded(Vec::new()), datetime!(2024-05-01 21:07 UTC), offset!(+9));
    let ChatBody::Greeting(line) = body else {
        panic!("expected greeting");
    };
    assert_eq!(line.text, GREETING_TEXT);
    assert_eq!(line.sender, Sender::Bot);
    assert_eq!(line.time, "06:07");
}

#[test]
fn history_row_renders_label_and_clock() {
    let body = chat_body(&loaded(vec![bot_hi()]), datetime!(2024-05-01 10:00 UTC), offset!(UTC));
    assert_eq!(
        body,
        ChatBody::Messages(vec![MessageLine {
            key: "1".to_owned(),
            sender: Sender::Bot,
            label: "봇",
            text: "hi".to_owned(),
            time: "09:05".to_owned(),
        }])
    );
}

#[test]
fn afternoon_uses_24_hour_clock() {
    let mut msg = bot_hi();
    msg.timestamp = datetime!(2024-05-01 15:30 UTC);
    let ChatBody::Messages(lines) = chat_body(&loaded(vec![msg]), datetime!(2024-05-01 16:00 UTC), offset!(UTC)) else {
        panic!("expected messages");
    };
    assert_eq!(lines[0].time, "15:30");
}

// =============================================================
// Input flags
// =============================================================

#[test]
fn submit_disabled_for_blank_draft() {
    let mut state = loaded(Vec::new());
    state.draft = "   ".to_owned();
    assert!(can_edit(&state));
    assert!(!can_submit(&state));
    state.draft = "hey".to_owned();
    assert!(can_submit(&state));
}

#[test]
fn input_disabled_while_loading_or_failed() {
    let mut state = loaded(Vec::new());
    state.draft = "hey".to_owned();
    state.is_loading = true;
    assert!(!can_edit(&state));
    assert!(!can_submit(&state));

    state.is_loading = false;
    state.error = Some("failed".to_owned());
    assert!(!can_edit(&state));
    assert!(!can_submit(&state));
}

// =============================================================
// Reactive inputs
// =============================================================

#[test]
fn draft_edits_do_not_move_scroll_or_body() {
    let mut state = loaded(vec![bot_hi()]);
    let now = datetime!(2024-05-01 10:00 UTC);
    let trigger = scroll_trigger(&state);
    let body = chat_body(&state, now, offset!(UTC));

    state.draft = "typing".to_owned();
    assert_eq!(scroll_trigger(&state), trigger);
    assert_eq!(chat_body(&state, now, offset!(UTC)), body);

    let mut second = bot_hi();
    second.id = Some("2".to_owned());
    second.timestamp = datetime!(2024-05-01 09:06 UTC);
    state.messages.push(second);
    assert_ne!(scroll_trigger(&state), trigger);
}

#[test]
fn enter_submits_only_outside_composition() {
    assert!(submits_on_key("Enter", false, false));
    assert!(!submits_on_key("Enter", true, false));
    assert!(!submits_on_key("Enter", false, true));
    assert!(!submits_on_key("a", false, false));
}

#[test]
fn message_keys_are_stable_across_appends() {
    let mut state = loaded(vec![bot_hi()]);
    let now = datetime!(2024-05-01 10:00 UTC);
    let ChatBody::Messages(before) = chat_body(&state, now, offset!(UTC)) else {
        panic!("expected messages");
    };
    let mut later = bot_hi();
    later.id = Some("2".to_owned());
    later.timestamp = datetime!(2024-05-01 09:07 UTC);
    state.messages.push(later);
    let ChatBody::Messages(after) = chat_body(&state, now, offset!(UTC)) else {
        panic!("expected messages");
    };
    assert_eq!(after[0].key, before[0].key);
    assert_eq!(after[1].key, "2");
}

#[test]
fn bubble_class_marks_sender() {
    assert!(bubble_class(Sender::User).ends_with("--user"));
    assert!(bubble_class(Sender::Bot).ends_with("--bot"));
}
