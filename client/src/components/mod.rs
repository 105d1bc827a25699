//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read shared state from Leptos context providers and report
//! user actions to the chat runtime as intents.

pub mod chat_widget;
