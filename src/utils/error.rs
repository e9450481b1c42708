use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Element not found: {field}")]
    ElementNotFound { field: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
