//! Axum binding: mounts a [`Listener`] as an axum route.
//!
//! The listener runs on its own task and writes into a [`ChannelResponse`].
//! The status line travels over a oneshot; body chunks over a bounded mpsc
//! that axum drains as the client reads, which is what throttles the
//! handler's body stream.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{MethodRouter, any},
};
use futures::TryStreamExt;
use hostless_core::{BodyError, BodyStream, RawHeaderValue, RawQueryValue, ResponseError};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::adapter::{Handler, Listener};
use crate::host::{RawRequest, RawResponse};
use crate::query;

/// Default number of body chunks buffered between the listener and axum.
pub const DEFAULT_BODY_BUFFER: usize = 16;

/// An axum request seen through [`RawRequest`].
pub struct AxumRawRequest {
    headers: HeaderMap,
    query: Option<String>,
    body: Body,
}

impl From<Request<Body>> for AxumRawRequest {
    fn from(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            headers: parts.headers,
            query: parts.uri.query().map(str::to_owned),
            body,
        }
    }
}

impl RawRequest for AxumRawRequest {
    fn header_entries(&self) -> Vec<(String, RawHeaderValue)> {
        self.headers
            .keys()
            .map(|name| {
                let values: Vec<&HeaderValue> = self.headers.get_all(name).iter().collect();
                (name.as_str().to_owned(), header_value(&values))
            })
            .collect()
    }

    fn query_entries(&self) -> Vec<(String, RawQueryValue)> {
        self.query
            .as_deref()
            .map(query::parse)
            .unwrap_or_default()
            .into_iter()
            .collect()
    }

    fn into_body(self) -> BodyStream {
        Box::pin(
            self.body
                .into_data_stream()
                .map_err(|e| BodyError::new(e.to_string())),
        )
    }
}

/// Non-UTF-8 or non-visible-ASCII values make the whole header opaque.
fn header_value(values: &[&HeaderValue]) -> RawHeaderValue {
    let strings: Option<Vec<String>> = values
        .iter()
        .map(|v| v.to_str().ok().map(str::to_owned))
        .collect();

    match strings {
        None => RawHeaderValue::Opaque,
        Some(mut strings) if strings.len() == 1 => RawHeaderValue::Single(strings.remove(0)),
        Some(strings) if strings.is_empty() => RawHeaderValue::Absent,
        Some(strings) => RawHeaderValue::Multiple(strings),
    }
}

type Head = (StatusCode, HeaderMap);

/// Body items sent to axum. An `Err` makes hyper reset the body instead of
/// finishing it.
type BodyItem = Result<Bytes, ResponseError>;

/// A response whose status line and body are forwarded to an axum
/// [`Response`] built by [`dispatch`].
pub struct ChannelResponse {
    head: Option<oneshot::Sender<Head>>,
    body: Option<mpsc::Sender<BodyItem>>,
}

impl ChannelResponse {
    fn new(head: oneshot::Sender<Head>, body: mpsc::Sender<BodyItem>) -> Self {
        Self {
            head: Some(head),
            body: Some(body),
        }
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ResponseError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ResponseError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ResponseError::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl RawResponse for ChannelResponse {
    async fn write_status_and_headers(
        &mut self,
        status: u16,
        headers: &BTreeMap<String, String>,
    ) -> Result<(), ResponseError> {
        let status =
            StatusCode::from_u16(status).map_err(|_| ResponseError::InvalidStatus(status))?;
        let headers = header_map(headers)?;
        let head = self.head.take().ok_or(ResponseError::HeadAlreadyWritten)?;
        head.send((status, headers)).map_err(|_| ResponseError::Closed)
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), ResponseError> {
        let body = self.body.as_ref().ok_or(ResponseError::Closed)?;
        body.send(Ok(chunk)).await.map_err(|_| ResponseError::Closed)
    }

    async fn end_response(&mut self) -> Result<(), ResponseError> {
        // Dropping the sender finishes the axum body stream.
        self.body.take().map(drop).ok_or(ResponseError::Closed)
    }

    async fn abort_response(&mut self, reason: ResponseError) -> Result<(), ResponseError> {
        let body = self.body.take().ok_or(ResponseError::Closed)?;
        body.send(Err(reason)).await.map_err(|_| ResponseError::Closed)
    }
}

/// Serve one axum request through `listener`.
///
/// The listener keeps running after the client goes away: there is no way
/// to cancel a handler once it started.
pub async fn dispatch<C, H>(
    listener: Listener<C, H>,
    request: Request<Body>,
    buffer: usize,
) -> Response
where
    C: Send + Sync + 'static,
    H: Handler<C>,
{
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(buffer.max(1));

    let raw_request = AxumRawRequest::from(request);
    let raw_response = ChannelResponse::new(head_tx, body_tx);
    tokio::spawn(async move {
        if let Err(err) = listener.handle(raw_request, raw_response).await {
            tracing::debug!(error = %err, "error response could not be written");
        }
    });

    match head_rx.await {
        Ok((status, headers)) => {
            let mut response = Response::new(Body::from_stream(ReceiverStream::new(body_rx)));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        // The listener gave up before writing a status line.
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Mount a listener on every method of a route.
pub fn route<C, H, S>(listener: Listener<C, H>, buffer: usize) -> MethodRouter<S>
where
    C: Send + Sync + 'static,
    H: Handler<C>,
    S: Clone + Send + Sync + 'static,
{
    any(move |request: Request<Body>| dispatch(listener.clone(), request, buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HandlerResult, adapter};
    use axum::Router;
    use hostless_core::{HandlerRequest, HandlerResponse};
    use hostless_observability::MemorySink;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn inspect(_cfg: Arc<()>, req: HandlerRequest) -> HandlerResult {
        let summary = serde_json::json!({
            "headers": req.headers,
            "query": req.query,
        });
        Ok(HandlerResponse::new(200)
            .with_header("content-type", "application/json")
            .with_bytes(summary.to_string()))
    }

    async fn bad_header(_cfg: Arc<()>, _req: HandlerRequest) -> HandlerResult {
        Ok(HandlerResponse::new(200).with_header("bad header", "x"))
    }

    async fn stream_body(_cfg: Arc<()>, req: HandlerRequest) -> HandlerResult {
        Ok(HandlerResponse::new(200).with_body(req.body))
    }

    async fn cut_short(_cfg: Arc<()>, _req: HandlerRequest) -> HandlerResult {
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(BodyError::new("upstream reset")),
        ]);
        Ok(HandlerResponse::new(200).with_body(hostless_core::body::from_stream(chunks)))
    }

    fn app<H: Handler<()>>(handler: H, sink: Arc<MemorySink>) -> Router {
        let listener = adapter(handler).with_sink(sink).bind(());
        Router::new().route("/", route(listener, DEFAULT_BODY_BUFFER))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn normalizes_axum_headers_and_query() {
        let request = Request::builder()
            .uri("/?page=2&page=3&f%5Bstatus%5D=open")
            .header("X-Forwarded-For", "10.0.0.1")
            .header("x-forwarded-for", "10.0.0.2")
            .header("x-raw", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap())
            .body(Body::empty())
            .unwrap();

        let response = app(inspect, Arc::new(MemorySink::new()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(seen["headers"]["x-forwarded-for"], "10.0.0.2");
        assert!(seen["headers"].get("x-raw").is_none());
        assert_eq!(seen["query"]["page"], "3");
        assert_eq!(seen["query"]["f"], r#"{"status":"open"}"#);
    }

    #[tokio::test]
    async fn request_body_streams_back() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("round trip"))
            .unwrap();

        let response = app(stream_body, Arc::new(MemorySink::new()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "round trip");
    }

    #[tokio::test]
    async fn invalid_header_name_becomes_500() {
        let sink = Arc::new(MemorySink::new());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app(bad_header, sink.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        let id = text.strip_prefix("Internal Server Error ").unwrap();
        assert_eq!(sink.records()[0].request_id.to_string(), id);
        assert_eq!(
            sink.records()[0].error_message.as_deref(),
            Some("invalid header: bad header")
        );
    }

    #[tokio::test]
    async fn body_failure_after_status_breaks_the_response_body() {
        let sink = Arc::new(MemorySink::new());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app(cut_short, sink.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        assert!(body.is_err(), "truncated body must not read as complete");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn abort_sends_error_then_closes() {
        let (head_tx, _head_rx) = oneshot::channel();
        let (body_tx, mut body_rx) = mpsc::channel(2);
        let mut response = ChannelResponse::new(head_tx, body_tx);

        response.write_chunk(Bytes::from_static(b"a")).await.unwrap();
        response
            .abort_response(ResponseError::Io("reset".into()))
            .await
            .unwrap();

        assert_eq!(body_rx.recv().await, Some(Ok(Bytes::from_static(b"a"))));
        assert_eq!(
            body_rx.recv().await,
            Some(Err(ResponseError::Io("reset".into())))
        );
        assert_eq!(body_rx.recv().await, None);
        assert_eq!(response.end_response().await, Err(ResponseError::Closed));
    }

    #[test]
    fn header_value_shapes() {
        let a = HeaderValue::from_static("a");
        let b = HeaderValue::from_static("b");
        let raw = HeaderValue::from_bytes(&[0xff]).unwrap();

        assert_eq!(header_value(&[&a]), RawHeaderValue::Single("a".into()));
        assert_eq!(
            header_value(&[&a, &b]),
            RawHeaderValue::Multiple(vec!["a".into(), "b".into()])
        );
        assert_eq!(header_value(&[&a, &raw]), RawHeaderValue::Opaque);
        assert_eq!(header_value(&[]), RawHeaderValue::Absent);
    }

    #[tokio::test]
    async fn end_twice_reports_closed() {
        let (head_tx, _head_rx) = oneshot::channel();
        let (body_tx, _body_rx) = mpsc::channel(1);
        let mut response = ChannelResponse::new(head_tx, body_tx);

        response.end_response().await.unwrap();
        assert_eq!(response.end_response().await, Err(ResponseError::Closed));
        assert_eq!(
            response.write_chunk(Bytes::from_static(b"late")).await,
            Err(ResponseError::Closed)
        );
    }

    #[tokio::test]
    async fn chunk_write_waits_for_reader() {
        let (head_tx, _head_rx) = oneshot::channel();
        let (body_tx, mut body_rx) = mpsc::channel(1);
        let mut response = ChannelResponse::new(head_tx, body_tx);

        response.write_chunk(Bytes::from_static(b"1")).await.unwrap();
        // Buffer of one is full; the next write must wait for a read.
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            response.write_chunk(Bytes::from_static(b"2")),
        )
        .await;
        assert!(blocked.is_err());

        assert!(body_rx.recv().await.is_some());
        response.write_chunk(Bytes::from_static(b"3")).await.unwrap();
    }
}
