//! One structured record per failed request.
//!
//! The adapter emits exactly one [`DiagnosticRecord`] when a request ends on
//! the error path, and nothing else. Field names serialize in camelCase so
//! existing log queries (`requestId`, `errorMessage`, ...) keep working.

use std::sync::{Mutex, MutexGuard, PoisonError};

use hostless_core::{HandlerFailure, HttpHeaders, RequestId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub request_id: RequestId,
    pub error_message: Option<String>,
    pub request_headers: HttpHeaders,
    pub error_stack: Option<String>,
}

impl DiagnosticRecord {
    pub fn new(
        request_id: RequestId,
        request_headers: HttpHeaders,
        failure: HandlerFailure,
    ) -> Self {
        Self {
            request_id,
            error_message: failure.message,
            request_headers,
            error_stack: failure.stack,
        }
    }
}

/// Where diagnostic records go.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, record: &DiagnosticRecord);
}

/// Emits each record as a `tracing` error event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &DiagnosticRecord) {
        let request_headers =
            serde_json::to_string(&record.request_headers).unwrap_or_else(|_| "{}".to_string());

        tracing::error!(
            request_id = %record.request_id,
            error_message = record.error_message.as_deref(),
            request_headers = %request_headers,
            error_stack = record.error_stack.as_deref(),
            "request handler failed"
        );
    }
}

/// Keeps records in memory (tests, embedding hosts that ship records
/// elsewhere).
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<Vec<DiagnosticRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A panic elsewhere while holding the lock leaves the records intact.
    fn lock(&self) -> MutexGuard<'_, Vec<DiagnosticRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, record: &DiagnosticRecord) {
        self.lock().push(record.clone());
    }
}
