use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

/// Configuration for the admin console
/// Base URL of the admin backend REST API
/// Read from ADMIN_API_URL environment variable
/// Default: http://localhost:8000/api
pub static ADMIN_API_URL: Lazy<String> = Lazy::new(|| {
    env::var("ADMIN_API_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "http://localhost:8000/api".to_string())
});

/// Optional bearer token for the admin backend
/// Read from ADMIN_API_TOKEN environment variable
/// Empty values are treated as unset
pub static ADMIN_API_TOKEN: Lazy<Option<SecretString>> = Lazy::new(|| {
    env::var("ADMIN_API_TOKEN")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: subadmin.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "subadmin.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Default viewer language for the bot preview
/// Read from PREVIEW_LANGUAGE environment variable
/// Default: ru
pub static PREVIEW_LANGUAGE: Lazy<String> =
    Lazy::new(|| env::var("PREVIEW_LANGUAGE").unwrap_or_else(|_| "ru".to_string()));

/// Network configuration
pub mod network {
    use super::{env, Duration, Lazy};

    /// Default request timeout for backend calls (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connect timeout (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Request timeout, overridable with REQUEST_TIMEOUT_SECS
    pub static REQUEST_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    });

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(*REQUEST_TIMEOUT_SECS)
    }

    /// Connect timeout duration
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}

/// Field limits enforced by the backend schema
pub mod limits {
    /// Maximum length of a button label (text_ru / text_en), in characters
    pub const TEXT_MAX_CHARS: usize = 100;

    /// Maximum length of an icon, in characters
    pub const ICON_MAX_CHARS: usize = 10;
}
