use engine::StoreError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("invalid credentials: {0}")]
    Credentials(String),
    #[error("token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid url: {0}")]
    Url(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<SheetsError> for StoreError {
    fn from(err: SheetsError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
