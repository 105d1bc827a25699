//! # client
//!
//! Leptos + WASM chat widget backed by a hosted message table.
//!
//! This crate contains the chat state and its controller, the store boundary
//! with Supabase and in-memory adapters, and the widget view. The controller
//! is plain data in, commands out; `controller::runtime` runs it against a
//! store and a timer.

pub mod app;
pub mod components;
pub mod controller;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: hydrate the server-rendered page.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
