use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entropy source failure: {0}")]
    Entropy(#[from] rand::Error),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid WIF: {0}")]
    InvalidWif(String),

    #[error("Address encoding failed: {0}")]
    AddressEncoding(String),

    #[error("Lookup store unavailable")]
    StoreUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_wif<S: Into<String>>(msg: S) -> Self {
        Self::InvalidWif(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::BAD_GATEWAY,
            Self::Entropy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidKey(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWif(_) => StatusCode::BAD_REQUEST,
            Self::AddressEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}
