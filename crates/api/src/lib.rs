//! Mount framework-agnostic handlers on a host HTTP server.
//!
//! - `host`: what a host server must expose (raw request/response traits)
//! - `adapter`: the two-stage `adapter(handler)` → `bind(config)` → `Listener`
//! - `pipe`: chunked body transfer into a raw response
//! - `query`: bracket-notation query string parsing
//! - `server`: the axum binding
//! - `app`: demo routes and env configuration for the binary

pub mod adapter;
pub mod app;
pub mod host;
pub mod pipe;
pub mod query;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::{Handler, HandlerResult, Listener, RequestAdapter, adapter};
pub use host::{RawRequest, RawResponse};
