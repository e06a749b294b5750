#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[cfg(feature = "http")]
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {detail}")]
    Http {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("{operation}: malformed response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation}: malformed URL in response: {source}")]
    InvalidUrl {
        operation: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),
    #[error("Login error: {0}")]
    Login(String),
    #[error("Cookie storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
