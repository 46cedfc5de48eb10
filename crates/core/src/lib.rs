//! `hostless-core` — the framework-agnostic handler contract.
//!
//! This crate contains **no host server code**: only the request/response
//! shapes handlers are written against, the correlation id, and the total
//! coercions that turn raw header/query collections into plain mappings.

pub mod body;
pub mod error;
pub mod http;
pub mod id;
pub mod normalize;

pub use body::BodyStream;
pub use error::{BodyError, HandlerFailure, InvalidRequestId, ResponseError};
pub use http::{HandlerRequest, HandlerResponse, HttpHeaders, HttpQueryParams};
pub use id::RequestId;
pub use normalize::{RawHeaderValue, RawQueryValue, normalize_headers, normalize_query};
