//! HTTP transport construction and context tracking

mod transport;

pub(crate) use transport::classify_send_error;
pub use transport::{ContextId, Transport, TransportBuilder};
