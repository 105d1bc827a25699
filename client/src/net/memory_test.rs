use super::*;
use crate::state::chat::Sender;
use futures::StreamExt;
use futures::executor::block_on;
use time::OffsetDateTime;

fn new_message(text: &str) -> NewMessage {
    NewMessage { text: text.to_owned(), sender: Sender::User, timestamp: OffsetDateTime::UNIX_EPOCH }
}

#[test]
fn insert_assigns_id_and_notifies_subscriber() {
    block_on(async {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_inserts().await.unwrap();

        store.insert(new_message("hello")).await.unwrap();

        let Some(StoreEvent::Inserted(msg)) = sub.events.next().await else {
            panic!("expected an insert event");
        };
        assert_eq!(msg.text, "hello");
        assert!(msg.id.is_some());
        assert_eq!(store.rows().len(), 1);
    });
}

#[test]
fn duplicate_delivery_sends_each_insert_twice() {
    block_on(async {
        let store = MemoryStore::new();
        store.duplicate_deliveries(true);
        let mut sub = store.subscribe_inserts().await.unwrap();

        store.insert(new_message("twice")).await.unwrap();
        store.unsubscribe(sub.handle).await;

        let events: Vec<_> = sub.events.by_ref().collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], events[1]);
    });
}

#[test]
fn unsubscribe_ends_feed() {
    block_on(async {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_inserts().await.unwrap();
        assert_eq!(store.active_subscriptions(), 1);

        store.unsubscribe(sub.handle).await;
        store.insert(new_message("after")).await.unwrap();

        assert_eq!(store.active_subscriptions(), 0);
        assert!(sub.events.next().await.is_none());
    });
}

#[test]
fn injected_failures_surface_as_errors_but_are_recorded() {
    block_on(async {
        let store = MemoryStore::new();
        store.fail_fetches(true);
        store.fail_inserts(true);

        assert!(store.fetch_all().await.is_err());
        assert!(store.insert(new_message("lost")).await.is_err());
        assert_eq!(store.fetch_calls(), 1);
        assert_eq!(store.inserts().len(), 1);
        assert!(store.rows().is_empty());
    });
}

#[test]
fn fetch_all_orders_by_timestamp() {
    block_on(async {
        let later = ChatMessage {
            id: Some("2".to_owned()),
            text: "later".to_owned(),
            sender: Sender::Bot,
            timestamp: OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(5),
        };
        let earlier = ChatMessage {
            id: Some("1".to_owned()),
            text: "earlier".to_owned(),
            sender: Sender::User,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        };
        let store = MemoryStore::with_rows(vec![later, earlier]);
        let rows = store.fetch_all().await.unwrap();
        assert_eq!(rows[0].text, "earlier");
        assert_eq!(rows[1].text, "later");
    });
}
