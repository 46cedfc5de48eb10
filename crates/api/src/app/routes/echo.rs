use std::sync::Arc;

use hostless_core::{HandlerRequest, HandlerResponse};

use crate::adapter::HandlerResult;

/// Streams the request body straight back, keeping its content type.
pub async fn echo(_config: Arc<()>, req: HandlerRequest) -> HandlerResult {
    let content_type = req
        .header("content-type")
        .unwrap_or("application/octet-stream")
        .to_owned();

    Ok(HandlerResponse::new(200)
        .with_header("content-type", content_type)
        .with_body(req.body))
}
