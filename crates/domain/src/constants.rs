//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! adapter.

// Remote API layout
pub const API_PATH_SUFFIX: &str = "/api";
pub const TOKEN_ENDPOINT: &str = "token/";

// Credential lifecycle
pub const DEFAULT_TOKEN_LIFETIME_MINS: i64 = 15;

// Request headers
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

// Task polling defaults
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 60;
pub const TASK_POLL_INITIAL_SECS: u64 = 2;
pub const TASK_POLL_MAX_SECS: u64 = 10;
pub const TASK_POLL_BACKOFF_FACTOR: f64 = 1.5;

// HTTP transport defaults
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
