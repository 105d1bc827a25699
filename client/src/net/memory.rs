//! In-memory message store.
//!
//! Stands in for the hosted table when the host has no backend configured,
//! and doubles as the fault-injecting fake for controller tests: fetches and
//! inserts can be made to fail, the feed can echo every insert twice, and
//! rows from "other clients" can be pushed in.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};

use crate::net::store::{RemoteMessageStore, StoreError, StoreEvent, Subscription, SubscriptionHandle};
use crate::net::types::NewMessage;
use crate::state::chat::ChatMessage;

#[derive(Default)]
struct Inner {
    rows: Vec<ChatMessage>,
    subscribers: BTreeMap<SubscriptionHandle, UnboundedSender<StoreEvent>>,
    next_handle: u64,
    fail_fetch: bool,
    fail_insert: bool,
    duplicate_delivery: bool,
    fetch_calls: usize,
    subscribe_calls: usize,
    inserts: Vec<NewMessage>,
}

/// Single-threaded in-memory table with a realtime fan-out.
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table.
    #[must_use]
    pub fn with_rows(rows: Vec<ChatMessage>) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().rows = rows;
        store
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.inner.borrow_mut().fail_fetch = fail;
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.inner.borrow_mut().fail_insert = fail;
    }

    /// Deliver every insert event twice, as an at-least-once feed may.
    pub fn duplicate_deliveries(&self, duplicate: bool) {
        self.inner.borrow_mut().duplicate_delivery = duplicate;
    }

    /// Insert a row as if another client wrote it.
    pub fn push_remote(&self, message: ChatMessage) {
        let mut inner = self.inner.borrow_mut();
        inner.rows.push(message.clone());
        inner.broadcast(&message);
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.borrow().fetch_calls
    }

    pub fn subscribe_calls(&self) -> usize {
        self.inner.borrow().subscribe_calls
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Every insert attempted, in call order, including failed ones.
    pub fn inserts(&self) -> Vec<NewMessage> {
        self.inner.borrow().inserts.clone()
    }

    pub fn rows(&self) -> Vec<ChatMessage> {
        self.inner.borrow().rows.clone()
    }
}

impl Inner {
    fn broadcast(&mut self, message: &ChatMessage) {
        let copies = if self.duplicate_delivery { 2 } else { 1 };
        self.subscribers.retain(|_, tx| {
            (0..copies).all(|_| tx.unbounded_send(StoreEvent::Inserted(message.clone())).is_ok())
        });
    }
}

#[async_trait(?Send)]
impl RemoteMessageStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.fetch_calls += 1;
        if inner.fail_fetch {
            return Err(StoreError::Request("memory store: fetch failure injected".to_owned()));
        }
        let mut rows = inner.rows.clone();
        rows.sort_by_key(|m| m.timestamp);
        Ok(rows)
    }

    async fn insert(&self, message: NewMessage) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.inserts.push(message.clone());
        if inner.fail_insert {
            return Err(StoreError::Request("memory store: insert failure injected".to_owned()));
        }
        let row = ChatMessage {
            id: Some(uuid::Uuid::new_v4().to_string()),
            text: message.text,
            sender: message.sender,
            timestamp: message.timestamp,
        };
        inner.rows.push(row.clone());
        inner.broadcast(&row);
        Ok(())
    }

    async fn subscribe_inserts(&self) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.subscribe_calls += 1;
        inner.next_handle += 1;
        let handle = SubscriptionHandle(inner.next_handle);
        let (tx, events) = mpsc::unbounded();
        inner.subscribers.insert(handle, tx);
        Ok(Subscription { handle, events })
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Some(tx) = self.inner.borrow_mut().subscribers.remove(&handle) {
            tx.close_channel();
        }
    }
}
