//! Outbound access to the restaurant backend.

mod client;
pub mod endpoints;

pub use client::{BackendBody, BackendClient, BackendError, RequestOptions};
