//! Single-threaded driver for `ChatController`.
//!
//! LIFECYCLE
//! =========
//! `ChatRuntime::run` owns the controller and loops over three sources:
//! view intents, completions of its own in-flight tasks (fetch, persist,
//! subscribe, timers), and events from live insert feeds. Every state change
//! happens on that loop, one wake at a time, and each change is published
//! through the `on_change` callback.
//!
//! Fetches and bot timers are abortable; feeds are aborted on unsubscribe.
//! Persists are not cancelled: after `Unmount` the loop drains the remaining
//! tasks before returning so a submitted message still reaches the store.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::{AbortHandle, Abortable, LocalBoxFuture};
use futures::stream::{FuturesUnordered, LocalBoxStream, SelectAll};
use futures::{FutureExt, StreamExt};
use time::OffsetDateTime;

use super::{ChatController, Command, PersistKind};
use crate::net::store::{RemoteMessageStore, StoreError, StoreEvent, Subscription, SubscriptionHandle};
use crate::state::chat::{ChatMessage, ChatState};

/// User intents emitted by the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Open,
    Close,
    Toggle,
    EditDraft(String),
    Submit,
    Unmount,
}

/// Cloneable handle the view uses to reach the runtime.
#[derive(Clone, Debug)]
pub struct IntentSender(UnboundedSender<Intent>);

impl IntentSender {
    pub fn channel() -> (Self, UnboundedReceiver<Intent>) {
        let (tx, rx) = mpsc::unbounded();
        (Self(tx), rx)
    }

    /// Queue an intent. Dropped once the runtime has exited.
    pub fn send(&self, intent: Intent) {
        let _ = self.0.unbounded_send(intent);
    }
}

/// Delays and wall-clock time for the runtime.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Browser timer backed by `setTimeout`.
#[cfg(feature = "hydrate")]
pub struct GlooTimer;

#[cfg(feature = "hydrate")]
impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }
}

enum Completion {
    History { generation: u64, result: Result<Vec<ChatMessage>, StoreError> },
    Subscribed { session: u64, result: Result<Subscription, StoreError> },
    Persisted { kind: PersistKind, result: Result<(), StoreError> },
    BotReplyDue { ticket: u64 },
    Released,
    Aborted,
}

enum Wake {
    Intent(Intent),
    Done(Completion),
    Event(u64, StoreEvent),
}

type Feed = Abortable<LocalBoxStream<'static, (u64, StoreEvent)>>;

pub struct ChatRuntime {
    controller: ChatController,
    store: Rc<dyn RemoteMessageStore>,
    timer: Rc<dyn Timer>,
    on_change: Box<dyn FnMut(&ChatState)>,
    published: Option<ChatState>,
    tasks: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
    feeds: SelectAll<Feed>,
    feed_aborts: HashMap<SubscriptionHandle, AbortHandle>,
    fetch_abort: Option<AbortHandle>,
    bot_aborts: HashMap<u64, AbortHandle>,
}

impl ChatRuntime {
    pub fn new(
        store: Rc<dyn RemoteMessageStore>,
        timer: Rc<dyn Timer>,
        bot_delay: Duration,
        on_change: impl FnMut(&ChatState) + 'static,
    ) -> Self {
        Self {
            controller: ChatController::new(bot_delay),
            store,
            timer,
            on_change: Box::new(on_change),
            published: None,
            tasks: FuturesUnordered::new(),
            feeds: SelectAll::new(),
            feed_aborts: HashMap::new(),
            fetch_abort: None,
            bot_aborts: HashMap::new(),
        }
    }

    /// Process intents until `Unmount` (or until every sender is dropped),
    /// then finish outstanding work.
    pub async fn run(mut self, mut intents: UnboundedReceiver<Intent>) {
        self.publish();
        while self.controller.is_mounted() {
            let wake = futures::select! {
                intent = intents.next() => Wake::Intent(intent.unwrap_or(Intent::Unmount)),
                done = self.tasks.select_next_some() => Wake::Done(done),
                (session, event) = self.feeds.select_next_some() => Wake::Event(session, event),
            };
            match wake {
                Wake::Intent(intent) => self.on_intent(intent),
                Wake::Done(done) => self.complete(done),
                Wake::Event(session, event) => self.controller.on_store_event(session, event),
            }
            self.publish();
        }

        while let Some(done) = self.tasks.next().await {
            self.complete(done);
        }
        self.publish();
    }

    fn on_intent(&mut self, intent: Intent) {
        let commands = match intent {
            Intent::Open => self.controller.open(),
            Intent::Close => self.controller.close(),
            Intent::Toggle => self.controller.toggle(),
            Intent::EditDraft(text) => {
                self.controller.set_draft(text);
                Vec::new()
            }
            Intent::Submit => self.controller.submit_draft(self.timer.now()),
            Intent::Unmount => self.controller.unmount(),
        };
        self.execute(commands);
    }

    fn complete(&mut self, done: Completion) {
        let commands = match done {
            Completion::History { generation, result } => {
                self.fetch_abort = None;
                self.controller.on_history(generation, result);
                Vec::new()
            }
            Completion::Subscribed { session, result } => match result {
                Ok(sub) => {
                    let handle = sub.handle;
                    self.attach_feed(session, sub);
                    self.controller.on_subscribed(session, Ok(handle))
                }
                Err(e) => self.controller.on_subscribed(session, Err(e)),
            },
            Completion::Persisted { kind, result } => self.controller.on_persisted(kind, result),
            Completion::BotReplyDue { ticket } => {
                self.bot_aborts.remove(&ticket);
                self.controller.on_bot_reply_due(ticket, self.timer.now())
            }
            Completion::Released | Completion::Aborted => Vec::new(),
        };
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Subscribe { session } => {
                    let store = Rc::clone(&self.store);
                    self.tasks.push(
                        async move { Completion::Subscribed { session, result: store.subscribe_inserts().await } }
                            .boxed_local(),
                    );
                }
                Command::Unsubscribe { handle } => {
                    if let Some(abort) = self.feed_aborts.remove(&handle) {
                        abort.abort();
                    }
                    let store = Rc::clone(&self.store);
                    self.tasks.push(
                        async move {
                            store.unsubscribe(handle).await;
                            Completion::Released
                        }
                        .boxed_local(),
                    );
                }
                Command::FetchHistory { generation } => {
                    let store = Rc::clone(&self.store);
                    let abort = self.push_abortable(async move {
                        Completion::History { generation, result: store.fetch_all().await }
                    });
                    self.fetch_abort = Some(abort);
                }
                Command::CancelFetch => {
                    if let Some(abort) = self.fetch_abort.take() {
                        abort.abort();
                    }
                }
                Command::Persist { kind, message } => {
                    let store = Rc::clone(&self.store);
                    self.tasks.push(
                        async move { Completion::Persisted { kind, result: store.insert(message).await } }.boxed_local(),
                    );
                }
                Command::ScheduleBotReply { ticket, delay } => {
                    let sleep = self.timer.sleep(delay);
                    let abort = self.push_abortable(async move {
                        sleep.await;
                        Completion::BotReplyDue { ticket }
                    });
                    self.bot_aborts.insert(ticket, abort);
                }
                Command::CancelBotReplies => {
                    for (_, abort) in self.bot_aborts.drain() {
                        abort.abort();
                    }
                }
            }
        }
    }

    fn push_abortable(&mut self, task: impl Future<Output = Completion> + 'static) -> AbortHandle {
        let (abort, registration) = AbortHandle::new_pair();
        self.tasks.push(Abortable::new(task, registration).map(|r| r.unwrap_or(Completion::Aborted)).boxed_local());
        abort
    }

    fn attach_feed(&mut self, session: u64, sub: Subscription) {
        let (abort, registration) = AbortHandle::new_pair();
        let events = sub.events.map(move |event| (session, event)).boxed_local();
        self.feeds.push(Abortable::new(events, registration));
        self.feed_aborts.insert(sub.handle, abort);
    }

    fn publish(&mut self) {
        let state = self.controller.state();
        if self.published.as_ref() != Some(state) {
            (self.on_change)(state);
            self.published = Some(state.clone());
        }
    }
}

/// Start the widget runtime in the browser.
///
/// Loads the host's widget config first; without a configured backend the
/// widget runs on an in-tab `MemoryStore`.
#[cfg(feature = "hydrate")]
pub fn spawn_chat_runtime(chat: leptos::prelude::RwSignal<ChatState>, intents: UnboundedReceiver<Intent>) {
    use leptos::prelude::Set;

    use crate::net::memory::MemoryStore;
    use crate::net::supabase::SupabaseStore;
    use crate::net::types::WidgetConfig;

    leptos::task::spawn_local(async move {
        let config = match crate::net::api::fetch_widget_config().await {
            Ok(config) => config,
            Err(e) => {
                leptos::logging::warn!("widget config unavailable, using defaults: {e}");
                WidgetConfig::default()
            }
        };
        let store: Rc<dyn RemoteMessageStore> = match config.backend.clone() {
            Some(backend) => Rc::new(SupabaseStore::new(backend)),
            None => {
                leptos::logging::log!("no backend configured; messages are kept in this tab only");
                Rc::new(MemoryStore::new())
            }
        };
        let runtime = ChatRuntime::new(store, Rc::new(GlooTimer), config.bot_reply_delay(), move |state: &ChatState| {
            // The widget may already be gone when the final drain publishes.
            let _ = chat.try_set(state.clone());
        });
        runtime.run(intents).await;
    });
}
