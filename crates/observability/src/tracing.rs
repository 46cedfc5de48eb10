//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Log output settings, read from the environment.
///
/// - `RUST_LOG`: filter directives (default `info`)
/// - `HOSTLESS_LOG_FORMAT`: `json` (default) or `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: true,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            filter: lookup("RUST_LOG").unwrap_or(defaults.filter),
            json: !matches!(
                lookup("HOSTLESS_LOG_FORMAT").as_deref(),
                Some("text") | Some("pretty")
            ),
        }
    }
}

/// Initialize tracing/logging for the process from the environment.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(&LogSettings::from_env());
}

pub fn init_with(settings: &LogSettings) {
    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    // Already-initialized is not an error worth surfacing.
    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
