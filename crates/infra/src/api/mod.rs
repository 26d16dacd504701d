//! Tree service API dispatch

mod client;

pub use client::TreeClient;
