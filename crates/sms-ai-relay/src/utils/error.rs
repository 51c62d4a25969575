use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::twiml::TwimlAck;

/// Errors that end an exchange early. Later stages degrade instead of
/// failing, and panics are answered by the catch-panic layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Twilio only reads the status of a webhook answer, so every error is an
/// empty TwiML document with the mapped status code.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                StatusCode::BAD_REQUEST
            }
        };

        TwimlAck::with_status(status).into_response()
    }
}

/// Failures talking to the completion or SMS provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("SMS error: {0}")]
    Sms(String),
}
