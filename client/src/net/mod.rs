//! Networking: the message-store boundary and its adapters.
//!
//! SYSTEM CONTEXT
//! ==============
//! `store` defines the `RemoteMessageStore` seam the controller runtime is
//! built on. `supabase` implements it over `postgrest` (queries, inserts) and
//! `realtime` (insert feed); `memory` implements it in-process. `api` fetches
//! the widget config from the host, and `types` defines the wire schema.

pub mod api;
pub mod memory;
pub mod postgrest;
pub mod realtime;
pub mod store;
pub mod supabase;
pub mod types;
