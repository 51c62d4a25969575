use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Response},
    Form,
};
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::models::chat::InboundSms;
use crate::services::ExchangeCoordinator;
use crate::utils::{ApiError, TwimlAck};

/// Twilio inbound message webhook. Always answers with exactly one empty
/// TwiML document: 200 handled or ignored, 400 malformed, 500 on failure.
pub async fn sms_webhook(
    State(coordinator): State<Arc<ExchangeCoordinator>>,
    form: Result<Form<InboundSms>, FormRejection>,
) -> Response {
    let span = info_span!("exchange", exchange_id = %Uuid::new_v4());

    async move {
        let Form(sms) = match form {
            Ok(form) => form,
            Err(rejection) => {
                return ApiError::BadRequest(format!("Invalid webhook payload: {}", rejection))
                    .into_response();
            }
        };

        match coordinator.handle(sms).await {
            Ok(outcome) => {
                debug!(?outcome, "Exchange finished");
                TwimlAck::ok().into_response()
            }
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}
