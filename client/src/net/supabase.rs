//! `RemoteMessageStore` backed by a hosted Supabase project.
//!
//! Queries and inserts go through `postgrest`; the insert feed is one
//! realtime websocket per subscription, stopped through a oneshot held here.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "supabase_test.rs"]
mod supabase_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::net::postgrest;
use crate::net::store::{RemoteMessageStore, StoreError, Subscription, SubscriptionHandle};
use crate::net::types::{BackendConfig, NewMessage};
use crate::state::chat::ChatMessage;

pub struct SupabaseStore {
    config: BackendConfig,
    next_handle: Cell<u64>,
    feeds: RefCell<HashMap<SubscriptionHandle, oneshot::Sender<()>>>,
}

impl SupabaseStore {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self { config, next_handle: Cell::new(0), feeds: RefCell::new(HashMap::new()) }
    }

    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    fn allocate_handle(&self) -> SubscriptionHandle {
        let next = self.next_handle.get() + 1;
        self.next_handle.set(next);
        SubscriptionHandle(next)
    }
}

#[async_trait(?Send)]
impl RemoteMessageStore for SupabaseStore {
    async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError> {
        postgrest::fetch_messages(&self.config).await
    }

    async fn insert(&self, message: NewMessage) -> Result<(), StoreError> {
        postgrest::insert_message(&self.config, &message).await
    }

    async fn subscribe_inserts(&self) -> Result<Subscription, StoreError> {
        let (events_tx, events) = futures::channel::mpsc::unbounded::<crate::net::store::StoreEvent>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        #[cfg(feature = "hydrate")]
        {
            crate::net::realtime::open_insert_feed(self.config.clone(), events_tx, stop_rx).await?;
            let handle = self.allocate_handle();
            self.feeds.borrow_mut().insert(handle, stop_tx);
            Ok(Subscription { handle, events })
        }
        #[cfg(not(feature = "hydrate"))]
        {
            drop((events_tx, events, stop_tx, stop_rx));
            Err(StoreError::Unavailable)
        }
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Some(stop) = self.feeds.borrow_mut().remove(&handle) {
            // The feed task may already have ended on its own.
            let _ = stop.send(());
        }
    }
}
