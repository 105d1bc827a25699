//! Floating chat widget: a toggle button that expands into a chat window.

use leptos::prelude::*;

use crate::controller::runtime::{Intent, IntentSender};
use crate::state::chat::ChatState;
use crate::util::chat_view::{
    ChatBody, INPUT_PLACEHOLDER, LOADING_TEXT, MessageLine, WIDGET_TITLE, bubble_class, can_edit, can_submit, chat_body,
    scroll_trigger, submits_on_key,
};
use crate::util::time_format::local_offset;

/// Chat widget driven by the `ChatState` signal; user actions go out as
/// `Intent`s to the chat runtime.
#[component]
pub fn ChatWidget() -> impl IntoView {
    let chat = expect_context::<RwSignal<ChatState>>();
    let intents = expect_context::<IntentSender>();

    let messages_ref = NodeRef::<leptos::html::Div>::new();
    let input_ref = NodeRef::<leptos::html::Input>::new();
    let was_open = RwSignal::new(false);

    on_cleanup({
        let intents = intents.clone();
        move || intents.send(Intent::Unmount)
    });

    // Draft edits republish the whole state; these only change with the list.
    let is_open = Memo::new(move |_| chat.with(|s| s.is_open));
    let list_shape = Memo::new(move |_| chat.with(scroll_trigger));
    let body = Memo::new(move |_| chat.with(|s| chat_body(s, time::OffsetDateTime::now_utc(), local_offset())));

    // Keep the newest message in view.
    Effect::new(move || {
        let (is_open, _) = list_shape.get();
        if !is_open {
            return;
        }
        #[cfg(feature = "hydrate")]
        request_animation_frame(move || {
            if let Some(el) = messages_ref.get_untracked() {
                el.set_scroll_top(el.scroll_height());
            }
        });
    });

    // Focus the input on every closed -> open transition.
    Effect::new(move || {
        let is_open = is_open.get();
        if is_open && !was_open.get_untracked() {
            #[cfg(feature = "hydrate")]
            request_animation_frame(move || {
                if let Some(input) = input_ref.get_untracked() {
                    let _ = input.focus();
                }
            });
        }
        was_open.set(is_open);
    });

    let send_submit = {
        let intents = intents.clone();
        move || {
            if can_submit(&chat.get_untracked()) {
                intents.send(Intent::Submit);
            }
        }
    };

    let on_submit = {
        let send_submit = send_submit.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            send_submit();
        }
    };

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if submits_on_key(&ev.key(), ev.shift_key(), ev.is_composing()) {
            ev.prevent_default();
            send_submit();
        }
    };

    let on_toggle = {
        let intents = intents.clone();
        move |_| intents.send(Intent::Toggle)
    };

    let on_close = {
        let intents = intents.clone();
        move |_| intents.send(Intent::Close)
    };

    let on_input = move |ev| intents.send(Intent::EditDraft(event_target_value(&ev)));

    let placeholder = move || {
        body.with(|b| match b {
            ChatBody::Loading => view! { <div class="chat-widget__placeholder">{LOADING_TEXT}</div> }.into_any(),
            ChatBody::Failed(error) => {
                let error = error.clone();
                view! { <div class="chat-widget__placeholder chat-widget__placeholder--error">{error}</div> }.into_any()
            }
            ChatBody::Greeting(line) => message_line(line.clone()).into_any(),
            ChatBody::Messages(_) => ().into_any(),
        })
    };

    let lines = move || {
        body.with(|b| match b {
            ChatBody::Messages(lines) => lines.clone(),
            _ => Vec::new(),
        })
    };

    view! {
        <div class="chat-widget">
            <Show
                when=move || is_open.get()
                fallback=move || {
                    let on_toggle = on_toggle.clone();
                    view! {
                        <button class="chat-widget__toggle" aria-label=WIDGET_TITLE on:click=on_toggle>
                            "💬"
                        </button>
                    }
                }
            >
                <section class="chat-widget__window" role="dialog" aria-label=WIDGET_TITLE>
                    <header class="chat-widget__header">
                        <span class="chat-widget__title">{WIDGET_TITLE}</span>
                        <button class="chat-widget__close" aria-label="닫기" on:click=on_close.clone()>
                            "×"
                        </button>
                    </header>

                    <div class="chat-widget__messages" node_ref=messages_ref>
                        {placeholder}
                        <For each=lines key=|line: &MessageLine| line.key.clone() children=message_line />
                    </div>

                    <form class="chat-widget__form" on:submit=on_submit.clone()>
                        <input
                            class="chat-widget__input"
                            type="text"
                            node_ref=input_ref
                            placeholder=INPUT_PLACEHOLDER
                            prop:value=move || chat.with(|s| s.draft.clone())
                            prop:disabled=move || !chat.with(can_edit)
                            on:input=on_input.clone()
                            on:keydown=on_keydown.clone()
                        />
                        <button
                            class="btn btn--primary chat-widget__send"
                            type="submit"
                            disabled=move || !chat.with(can_submit)
                        >
                            "전송"
                        </button>
                    </form>
                </section>
            </Show>
        </div>
    }
}

fn message_line(line: MessageLine) -> impl IntoView {
    view! {
        <div class=bubble_class(line.sender) data-key=line.key>
            <span class="chat-widget__author">{line.label}</span>
            <span class="chat-widget__text">{line.text}</span>
            <time class="chat-widget__time">{line.time}</time>
        </div>
    }
}
