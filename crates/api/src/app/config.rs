//! Environment configuration for the demo server.

use std::net::SocketAddr;

use crate::server::DEFAULT_BODY_BUFFER;

/// Settings read once at startup.
///
/// - `HOSTLESS_BIND_ADDR` (default `0.0.0.0:8080`)
/// - `HOSTLESS_GREETING` (default `hello`)
/// - `HOSTLESS_BODY_BUFFER`: chunks buffered per response (default 16)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub greeting: String,
    pub body_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            greeting: "hello".to_string(),
            body_buffer: DEFAULT_BODY_BUFFER,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = match lookup("HOSTLESS_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|e| {
                tracing::warn!(
                    value = %raw,
                    error = %e,
                    "invalid HOSTLESS_BIND_ADDR; using default"
                );
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let body_buffer = match lookup("HOSTLESS_BODY_BUFFER") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "invalid HOSTLESS_BODY_BUFFER; using default");
                    defaults.body_buffer
                }
            },
            None => defaults.body_buffer,
        };

        Self {
            bind_addr,
            greeting: lookup("HOSTLESS_GREETING").unwrap_or(defaults.greeting),
            body_buffer,
        }
    }
}
