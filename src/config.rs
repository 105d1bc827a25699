//! Host configuration parsed from environment variables.

use client::net::types::{BackendConfig, DEFAULT_BOT_REPLY_DELAY_MS, DEFAULT_SCHEMA, DEFAULT_TABLE, WidgetConfig};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required when SUPABASE_URL is set")]
    Missing { var: &'static str },
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Handed to the widget as-is over `/api/widget-config`.
    pub widget: WidgetConfig,
}

impl Config {
    /// Build typed host config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SUPABASE_URL`: hosted backend; unset or empty selects the
    ///   in-memory store in the widget
    /// - `SUPABASE_ANON_KEY`: required when `SUPABASE_URL` is set
    /// - `SUPABASE_SCHEMA`: default `public`
    /// - `SUPABASE_TABLE`: default `messages`
    /// - `BOT_REPLY_DELAY_MS`: default 1000
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = env_parse(var("PORT"), "PORT", DEFAULT_PORT)?;
        let bot_reply_delay_ms = env_parse(var("BOT_REPLY_DELAY_MS"), "BOT_REPLY_DELAY_MS", DEFAULT_BOT_REPLY_DELAY_MS)?;

        let backend = match var("SUPABASE_URL") {
            None => None,
            Some(url) => {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ConfigError::Invalid { var: "SUPABASE_URL", value: url });
                }
                let anon_key = var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing { var: "SUPABASE_ANON_KEY" })?;
                Some(BackendConfig {
                    url: url.trim_end_matches('/').to_owned(),
                    anon_key,
                    schema: var("SUPABASE_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_owned()),
                    table: var("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_owned()),
                })
            }
        };

        Ok(Self { port, widget: WidgetConfig { backend, bot_reply_delay_ms } })
    }
}

fn env_parse<T: std::str::FromStr>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
