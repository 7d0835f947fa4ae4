//! Error type shared by the medichat library crates.
//!
//! Variants follow where a failure came from, not how it is shown: the
//! session layer maps them onto user-facing messages.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    /// A response body or stream payload was not the JSON we expected.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The request never got an HTTP answer (DNS, connect, reset).
    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The remote answered successfully but the payload carried an error.
    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The remote answered with a non-success HTTP status.
    #[error("provider {provider}: HTTP {status} - {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    /// No usable credential, or the credential store failed.
    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
