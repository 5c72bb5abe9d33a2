use thiserror::Error;

/// Longest slice of an upstream error body kept for diagnostics.
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid player id '{0}'. Use the numeric SteamID3 account id")]
    InvalidPlayerId(String),

    #[error("No match history available for player {0}")]
    NoMatchHistory(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl AppError {
    /// Builds an upstream failure, keeping only the head of the body.
    pub fn api(status: u16, body: &str) -> Self {
        let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        AppError::ApiError { status, body }
    }
}
