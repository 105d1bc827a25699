//! Boundary to the hosted message table.
//!
//! DESIGN
//! ======
//! The controller never talks to a backend directly: its runtime is handed an
//! `Rc<dyn RemoteMessageStore>` at construction. Realtime inserts arrive as
//! typed `StoreEvent`s on the channel inside a `Subscription` rather than
//! through callbacks.
//!
//! Futures are `?Send` because the browser implementation holds JS handles;
//! everything runs on one thread.

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;

use crate::net::types::NewMessage;
use crate::state::chat::ChatMessage;

/// Failures at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not what the table contract promises.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The realtime channel could not be joined or broke.
    #[error("realtime channel error: {0}")]
    Realtime(String),

    /// Called outside the browser, where the hosted backend is unreachable.
    #[error("remote store unavailable in this environment")]
    Unavailable,
}

/// Opaque id of a live insert subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u64);

/// Events pushed by the realtime feed.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// A row was inserted. Delivery is at-least-once.
    Inserted(ChatMessage),
    /// The feed ended from the remote side.
    Closed,
}

/// A live insert feed. Dropping `events` stops delivery locally; call
/// `RemoteMessageStore::unsubscribe` to release the remote side.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub events: UnboundedReceiver<StoreEvent>,
}

/// Message table plus its insert feed.
#[async_trait(?Send)]
pub trait RemoteMessageStore {
    /// All messages, ascending by timestamp.
    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError>;

    /// Persist one message; id and server-side fields are assigned remotely.
    async fn insert(&self, message: NewMessage) -> Result<(), StoreError>;

    /// Start receiving insert notifications.
    async fn subscribe_inserts(&self) -> Result<Subscription, StoreError>;

    /// Stop the feed. No event for `handle` is sent after this returns.
    async fn unsubscribe(&self, handle: SubscriptionHandle);
}
