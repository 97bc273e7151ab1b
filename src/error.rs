use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Configuration error
    ConfigError(String),
    /// Pricing API call failed (network, auth or service error)
    ProviderFetch(String),
    /// A catalog entry did not have the expected shape
    MalformedEntry(String),
    /// A price lookup had no match
    NotFound,
    /// HTTP request error (preserves reqwest::Error for timeout detection)
    HttpRequest(reqwest::Error),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::ProviderFetch(msg) => write!(f, "Pricing API error: {}", msg),
            Self::MalformedEntry(msg) => write!(f, "Malformed catalog entry: {}", msg),
            Self::NotFound => write!(f, "Not found"),
            Self::HttpRequest(err) => write!(f, "HTTP request error: {}", err),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Lookups with no match answer with a bare 404
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::ProviderFetch(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            Self::HttpRequest(err) => (StatusCode::BAD_GATEWAY, err.to_string()).into_response(),
            Self::ConfigError(msg) | Self::MalformedEntry(msg) | Self::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

pub fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::ConfigError(_) => "config_error",
        AppError::ProviderFetch(_) => "provider_fetch_error",
        AppError::MalformedEntry(_) => "malformed_entry",
        AppError::NotFound => "not_found",
        AppError::HttpRequest(_) => "http_request_error",
        AppError::InternalError(_) => "internal_error",
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpRequest(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEntry(format!("JSON error: {}", err))
    }
}
