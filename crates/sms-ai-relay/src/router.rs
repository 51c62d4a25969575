use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;
use crate::utils::TwimlAck;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sms", post(handlers::sms::sms_webhook))
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .with_state(state)
        // Panics still get exactly one acknowledgment
        .layer(CatchPanicLayer::custom(panic_response))
        // Tracing
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Unexpected error in request handler");

    TwimlAck::with_status(StatusCode::INTERNAL_SERVER_ERROR).into_response()
}
