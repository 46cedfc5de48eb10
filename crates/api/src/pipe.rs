//! Body transfer from a handler's stream into a raw response.

use futures::StreamExt;
use hostless_core::{BodyError, BodyStream, HandlerFailure, ResponseError};
use thiserror::Error;

use crate::host::RawResponse;

/// Why a pipe stopped early.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipeError {
    /// The producer failed.
    #[error(transparent)]
    Source(#[from] BodyError),

    /// The sink refused a chunk.
    #[error(transparent)]
    Sink(#[from] ResponseError),
}

impl From<PipeError> for HandlerFailure {
    fn from(value: PipeError) -> Self {
        match value {
            PipeError::Source(e) => e.into(),
            PipeError::Sink(e) => e.into(),
        }
    }
}

/// Copy every chunk of `body` into `sink`, returning the byte count.
///
/// One chunk is in flight at a time: the next chunk is not pulled until the
/// sink accepted the previous one. Does not end the sink.
pub async fn pipe<R>(mut body: BodyStream, sink: &mut R) -> Result<u64, PipeError>
where
    R: RawResponse + ?Sized,
{
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        written += chunk.len() as u64;
        sink.write_chunk(chunk).await?;
    }
    Ok(written)
}
