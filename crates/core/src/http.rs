//! Request/response shapes handlers are written against.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::body::{self, BodyStream};
use crate::id::RequestId;

/// Lowercase header name to a single value.
pub type HttpHeaders = BTreeMap<String, String>;

/// Query parameter name to a single value (non-strings are JSON text).
pub type HttpQueryParams = BTreeMap<String, String>;

/// What a handler receives.
///
/// The body is the host's request body, passed through unread. Handlers
/// decide whether and how to consume it.
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub query: HttpQueryParams,
    pub headers: HttpHeaders,
    pub body: BodyStream,
}

impl HandlerRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

impl core::fmt::Debug for HandlerRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerRequest")
            .field("request_id", &self.request_id)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// What a handler returns.
///
/// `body: None` means no payload is written at all.
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Option<BodyStream>,
}

impl HandlerResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: BodyStream) -> Self {
        self.body = Some(body);
        self
    }

    /// Convenience for small in-memory payloads.
    pub fn with_bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.with_body(body::full(bytes))
    }
}

impl core::fmt::Debug for HandlerResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
