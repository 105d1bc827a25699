//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules keep formatting and view decisions out of components so
//! they can be tested natively.

pub mod chat_view;
pub mod time_format;
