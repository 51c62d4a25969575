use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Empty TwiML document: acknowledges the webhook without a message reply
pub const EMPTY_RESPONSE: &str = "<Response></Response>";

/// Webhook acknowledgment in the envelope Twilio expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwimlAck {
    status: StatusCode,
}

impl TwimlAck {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self { status }
    }
}

impl IntoResponse for TwimlAck {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
            EMPTY_RESPONSE,
        )
            .into_response()
    }
}
