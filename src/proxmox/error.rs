use thiserror::Error;

/// Failure of one API call. `tools::error::classify` maps these onto the
/// kinds reported to the agent; timeouts arrive as `Request`.
#[derive(Error, Debug)]
pub enum ProxmoxError {
    #[error("API request failed: {0} - {1}")]
    Api(reqwest::StatusCode, String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network/Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ProxmoxError>;
