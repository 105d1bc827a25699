//! Chat controller: the widget's state machine.
//!
//! DESIGN
//! ======
//! The controller performs no I/O. Each operation mutates `ChatState` and
//! returns the `Command`s that `runtime::ChatRuntime` executes against the
//! store and the timer; completions come back through the `on_*` methods.
//! This keeps every ordering rule testable without a browser or a clock.
//!
//! SESSIONS
//! ========
//! Each `open()` starts a new session. Subscriptions, persist completions,
//! and feed events are tagged with the session that issued them, and fetch
//! results with a generation; anything tagged with a stale value is ignored.

pub mod bot;
pub mod runtime;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::collections::BTreeMap;
use std::time::Duration;

use time::OffsetDateTime;

use crate::net::store::{StoreError, StoreEvent, SubscriptionHandle};
use crate::net::types::NewMessage;
use crate::state::chat::{ChatMessage, ChatState, FETCH_ERROR_MESSAGE, Sender};

/// Error taxonomy of the chat flow.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// History could not be loaded. Shown to the user; blocks input.
    #[error("history fetch failed: {0}")]
    Fetch(#[source] StoreError),

    /// A message could not be written. Logged only, never retried.
    #[error("{origin} message was not persisted: {source}")]
    Persist { origin: Sender, source: StoreError },
}

/// Which write a persist completion belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistKind {
    /// A user submission; `text` is the trimmed input the bot will quote.
    User { session: u64, text: String },
    Bot,
}

impl PersistKind {
    fn origin(&self) -> Sender {
        match self {
            Self::User { .. } => Sender::User,
            Self::Bot => Sender::Bot,
        }
    }
}

/// Side effects requested by the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Subscribe { session: u64 },
    Unsubscribe { handle: SubscriptionHandle },
    FetchHistory { generation: u64 },
    CancelFetch,
    Persist { kind: PersistKind, message: NewMessage },
    ScheduleBotReply { ticket: u64, delay: Duration },
    CancelBotReplies,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    Detached,
    Pending { session: u64 },
    Active { session: u64, handle: SubscriptionHandle },
}

/// Owns `ChatState` and the bookkeeping around in-flight work.
#[derive(Debug)]
pub struct ChatController {
    state: ChatState,
    bot_delay: Duration,
    mounted: bool,
    session: u64,
    link: Link,
    fetch_generation: u64,
    fetch_in_flight: bool,
    /// Feed inserts seen while a fetch was in flight; re-applied on top of it.
    arrived_during_fetch: Vec<ChatMessage>,
    next_ticket: u64,
    /// Pending bot replies by ticket, holding the text being quoted.
    pending_replies: BTreeMap<u64, String>,
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new(bot::BOT_REPLY_DELAY)
    }
}

impl ChatController {
    #[must_use]
    pub fn new(bot_delay: Duration) -> Self {
        Self {
            state: ChatState::default(),
            bot_delay,
            mounted: true,
            session: 0,
            link: Link::Detached,
            fetch_generation: 0,
            fetch_in_flight: false,
            arrived_during_fetch: Vec::new(),
            next_ticket: 0,
            pending_replies: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Bot replies scheduled but not yet fired.
    pub fn pending_bot_replies(&self) -> usize {
        self.pending_replies.len()
    }

    // =========================================================================
    // VISIBILITY
    // =========================================================================

    /// Show the widget, subscribe to inserts, and load history.
    ///
    /// Calling it while already open does nothing.
    pub fn open(&mut self) -> Vec<Command> {
        if self.state.is_open || !self.mounted {
            return Vec::new();
        }
        self.state.is_open = true;
        self.session += 1;
        self.link = Link::Pending { session: self.session };

        let mut commands = vec![Command::Subscribe { session: self.session }];
        commands.extend(self.fetch_history());
        commands
    }

    /// Hide the widget and tear down everything tied to the session.
    pub fn close(&mut self) -> Vec<Command> {
        if !self.state.is_open {
            return Vec::new();
        }
        self.state.is_open = false;
        self.teardown()
    }

    pub fn toggle(&mut self) -> Vec<Command> {
        if self.state.is_open { self.close() } else { self.open() }
    }

    /// Final teardown. Later operations are ignored.
    pub fn unmount(&mut self) -> Vec<Command> {
        let commands = self.close();
        self.mounted = false;
        commands
    }

    fn teardown(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.fetch_in_flight {
            self.fetch_in_flight = false;
            self.arrived_during_fetch.clear();
            commands.push(Command::CancelFetch);
        }
        if !self.pending_replies.is_empty() {
            self.pending_replies.clear();
            commands.push(Command::CancelBotReplies);
        }
        // A pending subscription is released when its handshake completes.
        if let Link::Active { handle, .. } = self.link {
            commands.push(Command::Unsubscribe { handle });
        }
        self.link = Link::Detached;
        commands
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Start a history load, superseding any load already in flight.
    pub fn fetch_history(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.fetch_in_flight {
            commands.push(Command::CancelFetch);
        }
        self.state.is_loading = true;
        self.state.error = None;
        self.fetch_generation += 1;
        self.fetch_in_flight = true;
        self.arrived_during_fetch.clear();
        commands.push(Command::FetchHistory { generation: self.fetch_generation });
        commands
    }

    /// Apply a finished history load. Superseded generations are ignored.
    pub fn on_history(&mut self, generation: u64, result: Result<Vec<ChatMessage>, StoreError>) {
        if !self.fetch_in_flight || generation != self.fetch_generation {
            return;
        }
        self.fetch_in_flight = false;
        let arrived = std::mem::take(&mut self.arrived_during_fetch);
        match result {
            Ok(history) => {
                self.state.apply_history(history);
                for msg in arrived {
                    self.state.insert_remote(msg);
                }
            }
            Err(e) => {
                leptos::logging::error!("{}", ChatError::Fetch(e));
                self.state.apply_fetch_error(FETCH_ERROR_MESSAGE);
            }
        }
    }

    // =========================================================================
    // REALTIME FEED
    // =========================================================================

    /// Apply the outcome of a `Subscribe` command.
    ///
    /// A subscription that outlived its session is released right away.
    pub fn on_subscribed(&mut self, session: u64, result: Result<SubscriptionHandle, StoreError>) -> Vec<Command> {
        match result {
            Ok(handle) => {
                if self.link == (Link::Pending { session }) {
                    self.link = Link::Active { session, handle };
                    Vec::new()
                } else {
                    vec![Command::Unsubscribe { handle }]
                }
            }
            Err(e) => {
                leptos::logging::warn!("realtime subscription failed: {e}");
                if self.link == (Link::Pending { session }) {
                    self.link = Link::Detached;
                }
                Vec::new()
            }
        }
    }

    /// Route an event from the subscription opened in `session`.
    pub fn on_store_event(&mut self, session: u64, event: StoreEvent) {
        let live = matches!(self.link, Link::Active { session: s, .. } if s == session);
        if !live {
            return;
        }
        match event {
            StoreEvent::Inserted(msg) => {
                self.on_remote_insert(msg);
            }
            StoreEvent::Closed => {
                leptos::logging::warn!("realtime feed closed; live updates stopped");
            }
        }
    }

    /// Add a message from the realtime feed unless it is already visible.
    ///
    /// Returns whether the list changed. Ignored while closed.
    pub fn on_remote_insert(&mut self, msg: ChatMessage) -> bool {
        if !self.state.is_open {
            return false;
        }
        if self.fetch_in_flight && !self.arrived_during_fetch.iter().any(|m| m.is_same_message(&msg)) {
            self.arrived_during_fetch.push(msg.clone());
        }
        self.state.insert_remote(msg)
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    /// Submit the current draft.
    pub fn submit_draft(&mut self, now: OffsetDateTime) -> Vec<Command> {
        let draft = self.state.draft.clone();
        self.submit(&draft, now)
    }

    /// Persist a user message.
    ///
    /// No-op unless the widget is open and accepting input, and `text` is
    /// not blank. The message list is not touched; the persisted row arrives
    /// through the feed.
    pub fn submit(&mut self, text: &str, now: OffsetDateTime) -> Vec<Command> {
        let trimmed = text.trim();
        if trimmed.is_empty() || !self.state.is_open || !self.state.input_enabled() || !self.mounted {
            return Vec::new();
        }
        let message = NewMessage { text: trimmed.to_owned(), sender: Sender::User, timestamp: now };
        let kind = PersistKind::User { session: self.session, text: trimmed.to_owned() };
        self.state.draft.clear();
        vec![Command::Persist { kind, message }]
    }

    /// Apply the outcome of a `Persist` command.
    ///
    /// A confirmed user message in the live session schedules the bot reply.
    pub fn on_persisted(&mut self, kind: PersistKind, result: Result<(), StoreError>) -> Vec<Command> {
        if let Err(source) = result {
            leptos::logging::warn!("{}", ChatError::Persist { origin: kind.origin(), source });
            return Vec::new();
        }
        match kind {
            PersistKind::User { session, text } if session == self.session && self.state.is_open && self.mounted => {
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                self.pending_replies.insert(ticket, text);
                vec![Command::ScheduleBotReply { ticket, delay: self.bot_delay }]
            }
            _ => Vec::new(),
        }
    }

    /// A bot-reply timer fired. Cancelled tickets produce nothing.
    pub fn on_bot_reply_due(&mut self, ticket: u64, now: OffsetDateTime) -> Vec<Command> {
        let Some(text) = self.pending_replies.remove(&ticket) else {
            return Vec::new();
        };
        let message = NewMessage { text: bot::scripted_reply(&text), sender: Sender::Bot, timestamp: now };
        vec![Command::Persist { kind: PersistKind::Bot, message }]
    }
}
