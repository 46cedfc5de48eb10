//! Streaming bodies.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, StreamExt};

use crate::error::BodyError;

/// A request or response payload, pulled chunk by chunk.
///
/// Nothing in the adapter buffers a whole body; consumers poll the stream
/// as fast as their sink accepts bytes.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BodyError>> + Send + 'static>>;

/// Wrap any compatible stream.
pub fn from_stream<S>(stream: S) -> BodyStream
where
    S: Stream<Item = Result<Bytes, BodyError>> + Send + 'static,
{
    Box::pin(stream)
}

/// A body made of a single chunk.
pub fn full(bytes: impl Into<Bytes>) -> BodyStream {
    let bytes = bytes.into();
    Box::pin(stream::once(async move { Ok(bytes) }))
}

/// A body with no chunks at all.
pub fn empty() -> BodyStream {
    Box::pin(stream::empty())
}

/// Drain a body into memory. Meant for tests and small payloads only.
pub async fn collect(mut body: BodyStream) -> Result<Vec<u8>, BodyError> {
    let mut out = Vec::new();
    while let Some(chunk) = body.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
