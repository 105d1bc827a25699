//! REST helpers for talking to the host.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning an error, since the endpoint is only
//! meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as `Err(String)`; the caller falls back to the default
//! config instead of failing hydration.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::types::WidgetConfig;

pub const WIDGET_CONFIG_ENDPOINT: &str = "/api/widget-config";

#[cfg(any(test, feature = "hydrate"))]
fn config_request_failed_message(status: u16) -> String {
    format!("widget config request failed: {status}")
}

/// Fetch the widget's runtime configuration from `/api/widget-config`.
pub async fn fetch_widget_config() -> Result<WidgetConfig, String> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::get(WIDGET_CONFIG_ENDPOINT)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.ok() {
            return Err(config_request_failed_message(resp.status()));
        }
        resp.json::<WidgetConfig>().await.map_err(|e| e.to_string())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err("not available on server".to_owned())
    }
}
