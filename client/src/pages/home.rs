//! Host page that embeds the chat widget.

use leptos::prelude::*;

use crate::components::chat_widget::ChatWidget;

/// Landing page. The widget floats over whatever the host renders here.
#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <main class="home">
            <h1 class="home__title">"Chatterbox"</h1>
            <p class="home__lede">"오른쪽 아래 버튼을 눌러 대화를 시작하세요."</p>
            <ChatWidget/>
        </main>
    }
}
