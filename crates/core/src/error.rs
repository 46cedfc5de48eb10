//! Error model for the adapter boundary.

use std::any::Any;

use thiserror::Error;

/// A request id string could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid request id: {0}")]
pub struct InvalidRequestId(pub String);

/// The request or response body stream failed mid-transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("body stream failed: {0}")]
pub struct BodyError(String);

impl BodyError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Writing to the host server's response failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// The peer or host server dropped the response.
    #[error("response closed")]
    Closed,

    /// Status and headers may be written only once.
    #[error("status and headers already written")]
    HeadAlreadyWritten,

    /// Body bytes were written before the status line.
    #[error("status and headers not written yet")]
    HeadNotWritten,

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The body was cut off; the host should break the transfer.
    #[error("response write failed: {0}")]
    Io(String),
}

/// Everything the adapter knows about a failed request.
///
/// Built from a handler's `anyhow::Error`, a panic payload, or a failure
/// while materializing the response. Both fields are best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub message: Option<String>,
    pub stack: Option<String>,
}

impl HandlerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            stack: None,
        }
    }

    /// `{:?}` of an anyhow error carries the context chain and, when
    /// `RUST_BACKTRACE` is set, the captured backtrace.
    pub fn from_error(err: anyhow::Error) -> Self {
        Self {
            message: Some(err.to_string()),
            stack: Some(format!("{err:?}")),
        }
    }

    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            Some((*s).to_string())
        } else {
            payload.downcast_ref::<String>().cloned()
        };
        Self {
            message,
            stack: None,
        }
    }
}

impl From<anyhow::Error> for HandlerFailure {
    fn from(value: anyhow::Error) -> Self {
        Self::from_error(value)
    }
}

impl From<ResponseError> for HandlerFailure {
    fn from(value: ResponseError) -> Self {
        Self {
            message: Some(value.to_string()),
            stack: Some(format!("{value:?}")),
        }
    }
}

impl From<BodyError> for HandlerFailure {
    fn from(value: BodyError) -> Self {
        Self {
            message: Some(value.to_string()),
            stack: Some(format!("{value:?}")),
        }
    }
}
