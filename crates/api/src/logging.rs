//! Tracing initialization and log helpers

use rootline_domain::RootlineError;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once —
/// later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Convert a `RootlineError` into a stable label suitable for metrics/logging.
#[inline]
#[must_use]
pub fn error_label(error: &RootlineError) -> &'static str {
    match error {
        RootlineError::InvalidCredentials => "invalid_credentials",
        RootlineError::ServiceUnreachable(_) => "service_unreachable",
        RootlineError::RequestTimeout(_) => "request_timeout",
        RootlineError::AuthenticationFailed => "authentication_failed",
        RootlineError::MissingPathParameter(_) => "missing_path_parameter",
        RootlineError::RemoteOperationFailed { .. } => "remote_operation_failed",
        RootlineError::TaskFailed(_) => "task_failed",
        RootlineError::TaskTimeout { .. } => "task_timeout",
        RootlineError::Config(_) => "config",
        RootlineError::Internal(_) => "internal",
    }
}
