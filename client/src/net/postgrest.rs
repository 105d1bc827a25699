//! PostgREST calls against the message table.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Elsewhere: the request builders stay available for tests, and the calls
//! return `StoreError::Unavailable`.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "postgrest_test.rs"]
mod postgrest_test;

use crate::net::store::StoreError;
use crate::net::types::{BackendConfig, NewMessage};
use crate::state::chat::ChatMessage;

/// `GET` URL selecting every row, oldest first.
pub fn select_url(config: &BackendConfig) -> String {
    format!("{}?select=*&order=timestamp.asc", table_url(config))
}

/// `POST` URL for inserts.
pub fn insert_url(config: &BackendConfig) -> String {
    table_url(config)
}

fn table_url(config: &BackendConfig) -> String {
    format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), config.table)
}

/// Headers every PostgREST call carries.
///
/// A non-default schema is selected through the profile headers.
pub fn auth_headers(config: &BackendConfig) -> Vec<(&'static str, String)> {
    let mut headers = vec![("apikey", config.anon_key.clone()), ("Authorization", format!("Bearer {}", config.anon_key))];
    if config.schema != crate::net::types::DEFAULT_SCHEMA {
        headers.push(("Accept-Profile", config.schema.clone()));
        headers.push(("Content-Profile", config.schema.clone()));
    }
    headers
}

/// Fetch all rows, dropping (and logging) any that fail validation.
pub async fn fetch_messages(config: &BackendConfig) -> Result<Vec<ChatMessage>, StoreError> {
    #[cfg(feature = "hydrate")]
    {
        let mut request = gloo_net::http::Request::get(&select_url(config));
        for (name, value) in auth_headers(config) {
            request = request.header(name, &value);
        }
        let resp = request.send().await.map_err(|e| StoreError::Request(e.to_string()))?;
        if !resp.ok() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: resp.status(), body });
        }
        let rows: Vec<serde_json::Value> = resp.json().await.map_err(|e| StoreError::Parse(e.to_string()))?;
        let (accepted, rejected) = crate::net::types::parse_message_rows(&rows);
        for err in rejected {
            leptos::logging::warn!("dropping history row: {err}");
        }
        Ok(accepted)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = config;
        Err(StoreError::Unavailable)
    }
}

/// Insert one row. The response body is not requested.
pub async fn insert_message(config: &BackendConfig, message: &NewMessage) -> Result<(), StoreError> {
    let row = message.to_row().map_err(|e| StoreError::Parse(e.to_string()))?;
    #[cfg(feature = "hydrate")]
    {
        let mut request = gloo_net::http::Request::post(&insert_url(config)).header("Prefer", "return=minimal");
        for (name, value) in auth_headers(config) {
            request = request.header(name, &value);
        }
        let resp = request
            .json(&[row])
            .map_err(|e| StoreError::Parse(e.to_string()))?
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        if !resp.ok() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: resp.status(), body });
        }
        Ok(())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (config, row);
        Err(StoreError::Unavailable)
    }
}
