use thiserror::Error;

/// Errors from the media server client.
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no metadata for {0}")]
    NotFound(String),
}
