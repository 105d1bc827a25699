//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State types are plain data so reducers can be exercised natively; the
//! view consumes them as `RwSignal` snapshots provided via context.

pub mod chat;
