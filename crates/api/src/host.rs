//! The host server side of the adapter.
//!
//! A host binding implements these two traits over its native request and
//! response objects. See `server` for the axum binding.

use async_trait::async_trait;
use bytes::Bytes;
use hostless_core::{BodyStream, RawHeaderValue, RawQueryValue, ResponseError};
use std::collections::BTreeMap;

/// A host request, consumed once per invocation.
pub trait RawRequest: Send {
    /// Every header name the host saw, with its raw value shape.
    fn header_entries(&self) -> Vec<(String, RawHeaderValue)>;

    /// Top-level query keys with their parsed (possibly nested) values.
    fn query_entries(&self) -> Vec<(String, RawQueryValue)>;

    /// Hand over the body unread.
    fn into_body(self) -> BodyStream;
}

/// A host response being written.
///
/// Call order is `write_status_and_headers`, zero or more `write_chunk`,
/// then `end_response` or `abort_response`. `write_chunk` must not complete
/// until the host can accept more bytes.
#[async_trait]
pub trait RawResponse: Send {
    async fn write_status_and_headers(
        &mut self,
        status: u16,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), ResponseError>;

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), ResponseError>;

    async fn end_response(&mut self) -> Result<(), ResponseError>;

    /// Close a response whose body could not be completed, so the client
    /// sees a broken transfer rather than a short one. Hosts with no way to
    /// signal that just end the response.
    async fn abort_response(&mut self, _reason: ResponseError) -> Result<(), ResponseError> {
        self.end_response().await
    }
}

/// Wraps a raw response and remembers how far it got.
///
/// Guarantees `end_response` or `abort_response` reaches the host at most
/// once, and lets the error path know whether a status line is already
/// committed.
#[derive(Debug)]
pub struct TrackedResponse<R> {
    inner: R,
    head_written: bool,
    ended: bool,
}

impl<R: RawResponse> TrackedResponse<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            head_written: false,
            ended: false,
        }
    }

    pub fn head_written(&self) -> bool {
        self.head_written
    }
}

#[async_trait]
impl<R: RawResponse> RawResponse for TrackedResponse<R> {
    async fn write_status_and_headers(
        &mut self,
        status: u16,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), ResponseError> {
        if self.head_written {
            return Err(ResponseError::HeadAlreadyWritten);
        }
        self.inner.write_status_and_headers(status, headers).await?;
        self.head_written = true;
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), ResponseError> {
        if !self.head_written {
            return Err(ResponseError::HeadNotWritten);
        }
        if self.ended {
            return Err(ResponseError::Closed);
        }
        self.inner.write_chunk(chunk).await
    }

    async fn end_response(&mut self) -> Result<(), ResponseError> {
        if self.ended {
            return Ok(());
        }
        // Marked before the call: a failing end is still the one end.
        self.ended = true;
        self.inner.end_response().await
    }

    async fn abort_response(&mut self, reason: ResponseError) -> Result<(), ResponseError> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        self.inner.abort_response(reason).await
    }
}
