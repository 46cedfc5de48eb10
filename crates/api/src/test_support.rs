//! In-memory host request/response doubles for unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use hostless_core::{BodyStream, RawHeaderValue, RawQueryValue, ResponseError, body};

use crate::host::{RawRequest, RawResponse};

pub struct FakeRequest {
    pub headers: Vec<(String, RawHeaderValue)>,
    pub query: Vec<(String, RawQueryValue)>,
    pub body: BodyStream,
}

impl FakeRequest {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            query: Vec::new(),
            body: body::empty(),
        }
    }

    pub fn header(mut self, name: &str, value: RawHeaderValue) -> Self {
        self.headers.push((name.to_string(), value));
        self
    }

    pub fn query(mut self, name: &str, value: RawQueryValue) -> Self {
        self.query.push((name.to_string(), value));
        self
    }

    pub fn body(mut self, body: BodyStream) -> Self {
        self.body = body;
        self
    }
}

impl RawRequest for FakeRequest {
    fn header_entries(&self) -> Vec<(String, RawHeaderValue)> {
        self.headers.clone()
    }

    fn query_entries(&self) -> Vec<(String, RawQueryValue)> {
        self.query.clone()
    }

    fn into_body(self) -> BodyStream {
        self.body
    }
}

#[derive(Debug, Default)]
pub struct ResponseLog {
    pub status: Option<u16>,
    pub heads: usize,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub chunks: usize,
    /// Counts both clean ends and aborts.
    pub ends: usize,
    pub aborted: Option<ResponseError>,
}

impl ResponseLog {
    pub fn body_text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailOn {
    Nothing,
    Chunks,
    Everything,
}

pub struct RecordingResponse {
    log: Arc<Mutex<ResponseLog>>,
    fail_on: FailOn,
}

impl RecordingResponse {
    pub fn new() -> (Self, Arc<Mutex<ResponseLog>>) {
        Self::with(FailOn::Nothing)
    }

    /// Accepts the status line but refuses every body chunk.
    pub fn failing_chunks() -> (Self, Arc<Mutex<ResponseLog>>) {
        Self::with(FailOn::Chunks)
    }

    /// Refuses every write, as a connection that is already gone.
    pub fn failing_everything() -> (Self, Arc<Mutex<ResponseLog>>) {
        Self::with(FailOn::Everything)
    }

    fn with(fail_on: FailOn) -> (Self, Arc<Mutex<ResponseLog>>) {
        let log = Arc::new(Mutex::new(ResponseLog::default()));
        (
            Self {
                log: log.clone(),
                fail_on,
            },
            log,
        )
    }
}

#[async_trait]
impl RawResponse for RecordingResponse {
    async fn write_status_and_headers(
        &mut self,
        status: u16,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), ResponseError> {
        if self.fail_on == FailOn::Everything {
            return Err(ResponseError::Closed);
        }
        let mut log = self.log.lock().unwrap();
        log.status = Some(status);
        log.heads += 1;
        log.headers = headers.clone();
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), ResponseError> {
        if self.fail_on != FailOn::Nothing {
            return Err(ResponseError::Closed);
        }
        let mut log = self.log.lock().unwrap();
        log.body.extend_from_slice(&chunk);
        log.chunks += 1;
        Ok(())
    }

    async fn end_response(&mut self) -> Result<(), ResponseError> {
        self.log.lock().unwrap().ends += 1;
        if self.fail_on == FailOn::Everything {
            return Err(ResponseError::Closed);
        }
        Ok(())
    }

    async fn abort_response(&mut self, reason: ResponseError) -> Result<(), ResponseError> {
        let mut log = self.log.lock().unwrap();
        log.ends += 1;
        log.aborted = Some(reason);
        if self.fail_on == FailOn::Everything {
            return Err(ResponseError::Closed);
        }
        Ok(())
    }
}
