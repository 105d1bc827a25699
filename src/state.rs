//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! only carries what the widget needs at runtime; messages live in the hosted
//! table, not here.

use std::sync::Arc;

use client::net::types::WidgetConfig;

#[derive(Clone)]
pub struct AppState {
    pub widget: Arc<WidgetConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(widget: WidgetConfig) -> Self {
        Self { widget: Arc::new(widget) }
    }
}
