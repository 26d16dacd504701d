//! # Rootline API
//!
//! Tool-call boundary of the adapter.
//!
//! This crate contains:
//! - The gateway: a single entry point turning tool invocations into
//!   dispatched operations
//! - Report generation with task polling absorbed behind one call
//! - Tracing initialization
//!
//! Callers on the other side of this boundary own all text formatting;
//! the gateway returns structured records, lists, or typed errors.

pub mod gateway;
pub mod logging;

// Re-export commonly used items
pub use gateway::{Gateway, ToolOutcome};
pub use logging::{error_label, init_tracing};
