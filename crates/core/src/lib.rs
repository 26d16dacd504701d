//! # Rootline Core
//!
//! Pure execution-core logic and port interfaces.
//!
//! This crate contains:
//! - The operation registry describing every remote endpoint
//! - Path template resolution
//! - Merge-on-write reconciliation for full-replace update endpoints
//! - The asynchronous task polling state machine and its status-source port
//!
//! ## Architecture
//! - Depends only on `rootline-domain`
//! - No I/O; network access is reached through the port defined in `poll`

pub mod merge;
pub mod ops;
pub mod poll;

// Re-export commonly used items
pub use merge::merge_update;
pub use ops::{ApiOperation, HttpMethod};
pub use poll::{wait_for_task, PollConfig, TaskStatusSource};
