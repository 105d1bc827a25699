//! Scripted bot reply.

#[cfg(test)]
#[path = "bot_test.rs"]
mod bot_test;

use std::time::Duration;

/// Delay between a confirmed user message and the bot's reply.
pub const BOT_REPLY_DELAY: Duration = Duration::from_millis(crate::net::types::DEFAULT_BOT_REPLY_DELAY_MS);

/// Reply text for an already-trimmed user message.
pub fn scripted_reply(trimmed: &str) -> String {
    format!("\"{trimmed}\" 라고 입력하셨습니다. 저는 고전적인 봇입니다.")
}
