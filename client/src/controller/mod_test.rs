use super::*;
use time::Duration as TimeDuration;

fn at(secs: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + TimeDuration::seconds(1_714_554_000 + secs)
}

fn msg(id: &str, sender: Sender, text: &str, secs: i64) -> ChatMessage {
    ChatMessage { id: Some(id.to_owned()), text: text.to_owned(), sender, timestamp: at(secs) }
}

fn count<F: Fn(&Command) -> bool>(commands: &[Command], pred: F) -> usize {
    commands.iter().filter(|c| pred(c)).count()
}

/// Open, acknowledge the subscription, and load `history`.
fn opened_with(history: Vec<ChatMessage>) -> (ChatController, SubscriptionHandle) {
    let mut ctl = ChatController::default();
    let commands = ctl.open();
    let session = commands
        .iter()
        .find_map(|c| match c {
            Command::Subscribe { session } => Some(*session),
            _ => None,
        })
        .unwrap();
    let generation = commands
        .iter()
        .find_map(|c| match c {
            Command::FetchHistory { generation } => Some(*generation),
            _ => None,
        })
        .unwrap();
    let handle = SubscriptionHandle(7);
    assert!(ctl.on_subscribed(session, Ok(handle)).is_empty());
    ctl.on_history(generation, Ok(history));
    (ctl, handle)
}

// =============================================================
// open / close
// =============================================================

#[test]
fn open_issues_one_subscribe_and_one_fetch() {
    let mut ctl = ChatController::default();
    let commands = ctl.open();
    assert_eq!(count(&commands, |c| matches!(c, Command::Subscribe { .. })), 1);
    assert_eq!(count(&commands, |c| matches!(c, Command::FetchHistory { .. })), 1);
    assert!(ctl.state().is_open);
    assert!(ctl.state().is_loading);
}

#[test]
fn open_twice_is_idempotent() {
    let mut ctl = ChatController::default();
    let first = ctl.open();
    let second = ctl.open();
    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
}

#[test]
fn close_unsubscribes_exactly_the_active_handle() {
    let (mut ctl, handle) = opened_with(Vec::new());
    let commands = ctl.close();
    assert_eq!(commands, vec![Command::Unsubscribe { handle }]);
    assert!(!ctl.state().is_open);
    assert!(ctl.close().is_empty());
}

#[test]
fn toggle_alternates_open_and_close() {
    let (mut ctl, handle) = opened_with(Vec::new());
    assert_eq!(ctl.toggle(), vec![Command::Unsubscribe { handle }]);
    let reopened = ctl.toggle();
    assert_eq!(count(&reopened, |c| matches!(c, Command::Subscribe { .. })), 1);
}

#[test]
fn close_during_fetch_cancels_and_ignores_late_result() {
    let mut ctl = ChatController::default();
    ctl.open();
    let commands = ctl.close();
    assert!(commands.contains(&Command::CancelFetch));

    ctl.on_history(1, Ok(vec![msg("1", Sender::Bot, "late", 0)]));
    assert!(ctl.state().messages.is_empty());
}

#[test]
fn subscription_completing_after_close_is_released() {
    let mut ctl = ChatController::default();
    ctl.open();
    ctl.close();
    let commands = ctl.on_subscribed(1, Ok(SubscriptionHandle(3)));
    assert_eq!(commands, vec![Command::Unsubscribe { handle: SubscriptionHandle(3) }]);
}

#[test]
fn stale_subscription_from_previous_session_is_released() {
    let mut ctl = ChatController::default();
    ctl.open();
    ctl.close();
    ctl.open();
    assert_eq!(ctl.on_subscribed(1, Ok(SubscriptionHandle(1))), vec![Command::Unsubscribe {
        handle: SubscriptionHandle(1)
    }]);
    assert!(ctl.on_subscribed(2, Ok(SubscriptionHandle(2))).is_empty());
}

#[test]
fn unmount_tears_down_and_blocks_reopen() {
    let (mut ctl, handle) = opened_with(Vec::new());
    assert_eq!(ctl.unmount(), vec![Command::Unsubscribe { handle }]);
    assert!(!ctl.is_mounted());
    assert!(ctl.open().is_empty());
}

// =============================================================
// history
// =============================================================

#[test]
fn history_row_becomes_single_bot_entry() {
    let (ctl, _) = opened_with(vec![msg("1", Sender::Bot, "hi", 0)]);
    let state = ctl.state();
    assert!(!state.is_loading);
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].sender, Sender::Bot);
    assert_eq!(state.messages[0].timestamp, at(0));
}

#[test]
fn fetch_failure_shows_error_and_blocks_submit() {
    let mut ctl = ChatController::default();
    ctl.open();
    ctl.on_history(1, Err(StoreError::Request("offline".to_owned())));

    let state = ctl.state();
    assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert!(state.messages.is_empty());
    assert!(!state.is_loading);
    assert!(!state.input_enabled());
    assert!(ctl.submit("hello", at(0)).is_empty());
}

#[test]
fn reopen_after_failure_clears_error() {
    let mut ctl = ChatController::default();
    ctl.open();
    ctl.on_history(1, Err(StoreError::Unavailable));
    ctl.close();
    ctl.open();
    assert!(ctl.state().error.is_none());
    assert!(ctl.state().is_loading);
}

#[test]
fn refetch_supersedes_previous_generation() {
    let mut ctl = ChatController::default();
    ctl.open();
    let commands = ctl.fetch_history();
    assert_eq!(commands, vec![Command::CancelFetch, Command::FetchHistory { generation: 2 }]);

    ctl.on_history(1, Ok(vec![msg("old", Sender::Bot, "old", 0)]));
    assert!(ctl.state().is_loading);
    ctl.on_history(2, Ok(vec![msg("new", Sender::Bot, "new", 0)]));
    assert_eq!(ctl.state().messages[0].text, "new");
}

#[test]
fn inserts_during_fetch_are_merged_into_history() {
    let mut ctl = ChatController::default();
    ctl.open();
    ctl.on_subscribed(1, Ok(SubscriptionHandle(1)));
    ctl.on_store_event(1, StoreEvent::Inserted(msg("3", Sender::User, "live", 30)));

    ctl.on_history(1, Ok(vec![msg("1", Sender::Bot, "a", 0), msg("3", Sender::User, "live", 30)]));
    let texts: Vec<_> = ctl.state().messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "live"]);

    let mut ctl = ChatController::default();
    ctl.open();
    ctl.on_subscribed(1, Ok(SubscriptionHandle(1)));
    ctl.on_store_event(1, StoreEvent::Inserted(msg("9", Sender::User, "newest", 90)));
    ctl.on_history(1, Ok(vec![msg("1", Sender::Bot, "a", 0)]));
    let texts: Vec<_> = ctl.state().messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "newest"]);
}

// =============================================================
// realtime feed
// =============================================================

#[test]
fn duplicate_delivery_is_visible_once() {
    let (mut ctl, _) = opened_with(Vec::new());
    let row = msg("5", Sender::User, "hello", 0);
    ctl.on_store_event(1, StoreEvent::Inserted(row.clone()));
    ctl.on_store_event(1, StoreEvent::Inserted(row));
    assert_eq!(ctl.state().messages.len(), 1);
}

#[test]
fn events_from_closed_session_are_ignored() {
    let (mut ctl, _) = opened_with(Vec::new());
    ctl.close();
    ctl.on_store_event(1, StoreEvent::Inserted(msg("5", Sender::User, "late", 0)));
    assert!(ctl.state().messages.is_empty());
    assert!(!ctl.on_remote_insert(msg("6", Sender::User, "late", 0)));
}

#[test]
fn out_of_order_inserts_are_sorted() {
    let (mut ctl, _) = opened_with(Vec::new());
    ctl.on_store_event(1, StoreEvent::Inserted(msg("2", Sender::Bot, "second", 20)));
    ctl.on_store_event(1, StoreEvent::Inserted(msg("1", Sender::User, "first", 10)));
    let texts: Vec<_> = ctl.state().messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}

// =============================================================
// submit and bot reply
// =============================================================

#[test]
fn blank_draft_issues_nothing() {
    let (mut ctl, _) = opened_with(Vec::new());
    assert!(ctl.submit("", at(0)).is_empty());
    assert!(ctl.submit("   \n\t", at(0)).is_empty());
}

#[test]
fn submit_while_loading_issues_nothing() {
    let mut ctl = ChatController::default();
    ctl.open();
    assert!(ctl.submit("hello", at(0)).is_empty());
}

#[test]
fn submit_after_close_issues_nothing() {
    let (mut ctl, _) = opened_with(Vec::new());
    ctl.set_draft("hello");
    ctl.close();
    assert!(ctl.submit_draft(at(0)).is_empty());
    assert!(ctl.submit("hello", at(0)).is_empty());
    assert_eq!(ctl.state().draft, "hello");
}

#[test]
fn submit_persists_trimmed_user_message_and_clears_draft() {
    let (mut ctl, _) = opened_with(Vec::new());
    ctl.set_draft("  hello  ");
    let commands = ctl.submit_draft(at(5));

    assert_eq!(commands, vec![Command::Persist {
        kind: PersistKind::User { session: 1, text: "hello".to_owned() },
        message: NewMessage { text: "hello".to_owned(), sender: Sender::User, timestamp: at(5) },
    }]);
    assert!(ctl.state().draft.is_empty());
    assert!(ctl.state().messages.is_empty());
}

#[test]
fn confirmed_user_persist_schedules_bot_reply() {
    let (mut ctl, _) = opened_with(Vec::new());
    let kind = PersistKind::User { session: 1, text: "hello".to_owned() };
    let commands = ctl.on_persisted(kind, Ok(()));
    assert_eq!(commands, vec![Command::ScheduleBotReply { ticket: 1, delay: Duration::from_millis(1000) }]);

    let reply = ctl.on_bot_reply_due(1, at(6));
    assert_eq!(reply, vec![Command::Persist {
        kind: PersistKind::Bot,
        message: NewMessage {
            text: "\"hello\" 라고 입력하셨습니다. 저는 고전적인 봇입니다.".to_owned(),
            sender: Sender::Bot,
            timestamp: at(6),
        },
    }]);
    assert_eq!(ctl.pending_bot_replies(), 0);
}

#[test]
fn failed_user_persist_schedules_nothing() {
    let (mut ctl, _) = opened_with(Vec::new());
    let kind = PersistKind::User { session: 1, text: "hello".to_owned() };
    assert!(ctl.on_persisted(kind, Err(StoreError::Request("down".to_owned()))).is_empty());
    assert!(ctl.state().error.is_none());
}

#[test]
fn close_cancels_pending_bot_reply() {
    let (mut ctl, handle) = opened_with(Vec::new());
    ctl.on_persisted(PersistKind::User { session: 1, text: "hello".to_owned() }, Ok(()));

    let commands = ctl.close();
    assert!(commands.contains(&Command::CancelBotReplies));
    assert!(commands.contains(&Command::Unsubscribe { handle }));
    assert!(ctl.on_bot_reply_due(1, at(1)).is_empty());
}

#[test]
fn user_persist_confirmed_after_close_schedules_nothing() {
    let (mut ctl, _) = opened_with(Vec::new());
    ctl.submit("hello", at(0));
    ctl.close();
    ctl.open();
    let kind = PersistKind::User { session: 1, text: "hello".to_owned() };
    assert!(ctl.on_persisted(kind, Ok(())).is_empty());
}

#[test]
fn bot_persist_confirmation_is_terminal() {
    let (mut ctl, _) = opened_with(Vec::new());
    assert!(ctl.on_persisted(PersistKind::Bot, Ok(())).is_empty());
}

#[test]
fn persist_error_names_origin() {
    let err = ChatError::Persist { origin: Sender::Bot, source: StoreError::Unavailable };
    assert!(err.to_string().starts_with("bot message was not persisted"));
}
