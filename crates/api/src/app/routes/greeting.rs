use std::sync::Arc;

use anyhow::{Context, anyhow};
use hostless_core::{HandlerRequest, HandlerResponse};

use crate::adapter::HandlerResult;

#[derive(Debug, Clone)]
pub struct GreetingConfig {
    pub greeting: String,
}

/// `/hello?name=...` → `"<greeting> <name>"`, tagged with the request id.
pub async fn hello(config: Arc<GreetingConfig>, req: HandlerRequest) -> HandlerResult {
    let name = req.query_param("name").unwrap_or("world");

    Ok(HandlerResponse::new(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_header("x-request-id", req.request_id.to_string())
        .with_bytes(format!("{} {}", config.greeting, name)))
}

/// Always fails; exercises the 500 path.
pub async fn fail(_config: Arc<()>, req: HandlerRequest) -> HandlerResult {
    Err(anyhow!("failure requested"))
        .with_context(|| format!("serving {}", req.request_id))
}
