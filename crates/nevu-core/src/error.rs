use thiserror::Error;

#[derive(Debug, Error)]
pub enum NevuError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("\"{0}\" is not available on this Plex Server")]
    NotOnServer(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored or user-supplied option string that names no known variant.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}
