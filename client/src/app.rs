//! Root application component with routing and context providers.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::controller::runtime::IntentSender;
use crate::pages::home::HomePage;
use crate::state::chat::ChatState;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="ko">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the chat state signal and the intent channel, and starts the
/// chat runtime in the browser.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let chat = RwSignal::new(ChatState::default());
    let (intents, rx) = IntentSender::channel();

    #[cfg(feature = "hydrate")]
    crate::controller::runtime::spawn_chat_runtime(chat, rx);
    #[cfg(not(feature = "hydrate"))]
    drop(rx);

    provide_context(chat);
    provide_context(intents);

    view! {
        <Stylesheet id="leptos" href="/pkg/chatterbox.css"/>
        <Title text="Chatterbox"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("") view=HomePage/>
            </Routes>
        </Router>
    }
}
