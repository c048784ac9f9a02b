use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YouTube API key not set. Run `yt-rank-sheet init` to configure.")]
    ApiKeyMissing,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Batch {batch} failed after retries: {message}")]
    BatchFailed { batch: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OAuth2 error: {0}")]
    OAuth2(#[from] yup_oauth2::Error),
}

impl Error {
    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = if body.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, body)
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authorization(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                Error::Transient(message)
            }
            s if s.is_server_error() => Error::Transient(message),
            s => Error::Api {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Worth another attempt after a backoff
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transient(_) => true,
            // Decode failures are usually bodies cut off in transit
            Error::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
