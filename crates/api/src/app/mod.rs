//! Demo application: contract-only handlers mounted on axum.
//!
//! - `config.rs`: env configuration
//! - `routes/`: handlers (one file per area), none of which import axum

use axum::Router;

use crate::adapter::adapter;
use crate::server;

pub mod config;
pub mod routes;

pub use config::AppConfig;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> Router {
    let greeting = routes::greeting::GreetingConfig {
        greeting: config.greeting.clone(),
    };

    Router::new()
        .route(
            "/hello",
            server::route(adapter(routes::greeting::hello).bind(greeting), config.body_buffer),
        )
        .route(
            "/fail",
            server::route(adapter(routes::greeting::fail).bind(()), config.body_buffer),
        )
        .route(
            "/echo",
            server::route(adapter(routes::echo::echo).bind(()), config.body_buffer),
        )
}
