//! Wire DTOs for the message table and the host config endpoint.
//!
//! DESIGN
//! ======
//! Rows coming off the backend are parsed strictly into `ChatMessage`:
//! unknown columns are ignored, but a row with a missing or empty `text`, an
//! unknown `sender`, or an unparsable `timestamp` is rejected with a
//! `RowError` instead of reaching chat state.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::chat::{ChatMessage, Sender};
use crate::util::time_format;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "messages";
pub const DEFAULT_BOT_REPLY_DELAY_MS: u64 = 1000;

// =============================================================================
// ROWS
// =============================================================================

/// Why a backend row was refused at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// The row is not an object with the expected column types.
    #[error("malformed row: {0}")]
    Shape(#[from] serde_json::Error),
    /// `text` is empty or whitespace.
    #[error("row has empty text")]
    EmptyText,
    /// `timestamp` is not an ISO-8601 date-time.
    #[error("row has invalid timestamp {raw:?}")]
    Timestamp { raw: String },
}

/// Server-assigned row id; Postgres serials arrive as numbers, uuids as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RowId {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
struct MessageRow {
    #[serde(default)]
    id: Option<RowId>,
    text: String,
    sender: Sender,
    timestamp: String,
}

/// Validate one row from the message table.
///
/// # Errors
///
/// Returns a `RowError` describing the first problem found.
pub fn parse_message_row(value: &serde_json::Value) -> Result<ChatMessage, RowError> {
    let row = MessageRow::deserialize(value)?;
    if row.text.trim().is_empty() {
        return Err(RowError::EmptyText);
    }
    let timestamp =
        time_format::parse_timestamp(&row.timestamp).map_err(|_| RowError::Timestamp { raw: row.timestamp.clone() })?;
    let id = row.id.map(|id| match id {
        RowId::Int(n) => n.to_string(),
        RowId::Text(s) => s,
    });
    Ok(ChatMessage { id, text: row.text, sender: row.sender, timestamp })
}

/// Validate a batch of rows, splitting accepted messages from rejections.
pub fn parse_message_rows(values: &[serde_json::Value]) -> (Vec<ChatMessage>, Vec<RowError>) {
    let mut accepted = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for value in values {
        match parse_message_row(value) {
            Ok(msg) => accepted.push(msg),
            Err(e) => rejected.push(e),
        }
    }
    (accepted, rejected)
}

/// A message to insert. The store assigns the id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMessage {
    pub text: String,
    pub sender: Sender,
    pub timestamp: OffsetDateTime,
}

/// JSON body of an insert.
#[derive(Debug, Serialize)]
pub struct NewMessageRow<'a> {
    pub text: &'a str,
    pub sender: Sender,
    pub timestamp: String,
}

impl NewMessage {
    /// Borrow as an insert row.
    ///
    /// # Errors
    ///
    /// Fails if the timestamp cannot be written as RFC 3339.
    pub fn to_row(&self) -> Result<NewMessageRow<'_>, time::error::Format> {
        Ok(NewMessageRow { text: &self.text, sender: self.sender, timestamp: time_format::format_timestamp(self.timestamp)? })
    }
}

// =============================================================================
// WIDGET CONFIG
// =============================================================================

/// Runtime configuration the host hands to the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Hosted backend; `None` runs the widget on the in-memory store.
    #[serde(default)]
    pub backend: Option<BackendConfig>,
    #[serde(default = "default_bot_reply_delay_ms")]
    pub bot_reply_delay_ms: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self { backend: None, bot_reply_delay_ms: DEFAULT_BOT_REPLY_DELAY_MS }
    }
}

impl WidgetConfig {
    pub fn bot_reply_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.bot_reply_delay_ms)
    }
}

/// Connection details for the hosted message table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key, sent as `apikey` and bearer token.
    pub anon_key: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_bot_reply_delay_ms() -> u64 {
    DEFAULT_BOT_REPLY_DELAY_MS
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_owned()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_owned()
}
