//! The request adapter.
//!
//! `adapter(handler)` captures a handler once per route type;
//! `RequestAdapter::bind(config)` fixes the config once per mounted route and
//! yields the [`Listener`] the host server calls for every request.
//!
//! Per request the listener moves through
//! `Received → Normalizing → HandlerRunning`, then either
//! `Succeeding → Writing → Closed` or `Failing → ErrorWriting → Closed`.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use hostless_core::{
    HandlerFailure, HandlerRequest, HandlerResponse, HttpHeaders, RequestId, ResponseError,
    normalize_headers, normalize_query,
};
use hostless_observability::{DiagnosticRecord, DiagnosticSink, TracingSink};

use crate::host::{RawRequest, RawResponse, TrackedResponse};
use crate::pipe::pipe;

/// Status written on the error path.
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// What handlers return.
pub type HandlerResult = anyhow::Result<HandlerResponse>;

/// Business logic written against the host-independent contract.
///
/// Implemented for every `Fn(Arc<C>, HandlerRequest) -> impl Future<Output = HandlerResult>`.
pub trait Handler<C>: Send + Sync + 'static {
    type Future: Future<Output = HandlerResult> + Send + 'static;

    fn call(&self, config: Arc<C>, request: HandlerRequest) -> Self::Future;
}

impl<C, F, Fut> Handler<C> for F
where
    F: Fn(Arc<C>, HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, config: Arc<C>, request: HandlerRequest) -> Self::Future {
        (self)(config, request)
    }
}

/// First stage: wrap a handler.
pub fn adapter<C, H>(handler: H) -> RequestAdapter<C, H>
where
    H: Handler<C>,
{
    RequestAdapter::new(handler)
}

/// A handler waiting for its config.
pub struct RequestAdapter<C, H> {
    handler: Arc<H>,
    sink: Arc<dyn DiagnosticSink>,
    _config: PhantomData<fn(C)>,
}

impl<C, H> Clone for RequestAdapter<C, H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            sink: self.sink.clone(),
            _config: PhantomData,
        }
    }
}

impl<C, H> RequestAdapter<C, H>
where
    H: Handler<C>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            sink: Arc::new(TracingSink),
            _config: PhantomData,
        }
    }

    /// Send diagnostic records somewhere other than `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Second stage: fix the config and produce the host-facing listener.
    pub fn bind(&self, config: C) -> Listener<C, H> {
        Listener {
            handler: self.handler.clone(),
            config: Arc::new(config),
            sink: self.sink.clone(),
        }
    }
}

/// A handler bound to its config, ready to serve requests.
pub struct Listener<C, H> {
    handler: Arc<H>,
    config: Arc<C>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<C, H> Clone for Listener<C, H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            config: self.config.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<C, H> Listener<C, H>
where
    C: Send + Sync + 'static,
    H: Handler<C>,
{
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Serve one request.
    ///
    /// Handler errors and panics never escape: they become a diagnostic
    /// record and a `500`. The only `Err` is a failure while writing that
    /// error response, which is left to the host's default handling.
    pub async fn handle<Req, Res>(&self, request: Req, response: Res) -> Result<(), ResponseError>
    where
        Req: RawRequest,
        Res: RawResponse,
    {
        let request_id = RequestId::new();
        let headers = normalize_headers(request.header_entries());
        let query = normalize_query(request.query_entries());

        let handler_request = HandlerRequest {
            request_id,
            query,
            headers: headers.clone(),
            body: request.into_body(),
        };

        let mut response = TrackedResponse::new(response);
        match self.respond(handler_request, &mut response).await {
            Ok(()) => Ok(()),
            Err(failure) => self.fail(request_id, headers, failure, &mut response).await,
        }
    }

    async fn respond<Res>(
        &self,
        request: HandlerRequest,
        response: &mut TrackedResponse<Res>,
    ) -> Result<(), HandlerFailure>
    where
        Res: RawResponse,
    {
        let outcome = self.invoke(request).await?;

        response
            .write_status_and_headers(outcome.status_code, &outcome.headers)
            .await?;
        if let Some(body) = outcome.body {
            pipe(body, response).await?;
        }
        response.end_response().await?;
        Ok(())
    }

    /// Run the handler on its own task so a panic is contained like an error.
    async fn invoke(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerFailure> {
        let handler = self.handler.clone();
        let config = self.config.clone();
        let task = tokio::spawn(async move { handler.call(config, request).await });

        match task.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(HandlerFailure::from_error(err)),
            Err(join) if join.is_panic() => Err(HandlerFailure::from_panic(join.into_panic())),
            Err(join) => Err(HandlerFailure::new(join.to_string())),
        }
    }

    async fn fail<Res>(
        &self,
        request_id: RequestId,
        headers: HttpHeaders,
        failure: HandlerFailure,
        response: &mut TrackedResponse<Res>,
    ) -> Result<(), ResponseError>
    where
        Res: RawResponse,
    {
        let reason = ResponseError::Io(
            failure
                .message
                .clone()
                .unwrap_or_else(|| "response body failed".to_string()),
        );
        self.sink.record(&DiagnosticRecord::new(request_id, headers, failure));

        if response.head_written() {
            // Status is on the wire; the body can only be cut off.
            return response.abort_response(reason).await;
        }

        let mut error_headers = HttpHeaders::new();
        error_headers.insert(
            "content-type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        );
        response
            .write_status_and_headers(INTERNAL_SERVER_ERROR, &error_headers)
            .await?;
        response.write_chunk(error_body(request_id).into()).await?;
        response.end_response().await
    }
}

/// Exact body of the generic 500.
pub fn error_body(request_id: RequestId) -> String {
    format!("Internal Server Error {request_id}")
}
