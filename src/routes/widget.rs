//! Widget configuration route.

use axum::Json;
use axum::extract::State;
use client::net::types::WidgetConfig;

use crate::state::AppState;

/// `GET /api/widget-config` — backend coordinates and reply delay for the
/// widget. The anon key is public by design of the backend.
pub async fn widget_config(State(state): State<AppState>) -> Json<WidgetConfig> {
    tracing::debug!(has_backend = state.widget.backend.is_some(), "serving widget config");
    Json(state.widget.as_ref().clone())
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
