use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::ReplyFrom;
use crate::models::chat::{ChatMessage, ConversationId, InboundSms};
use crate::services::admission::{Admission, AdmissionDecider};
use crate::services::completion::CompletionOrchestrator;
use crate::services::history::HistoryStore;
use crate::utils::error::ApiError;

/// Trait for outbound SMS delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<()>;
}

/// What happened to an inbound message that was acknowledged with 200
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Group message not addressed to the assistant
    Ignored { conversation_id: ConversationId },
    /// A reply was generated and stored; `delivered` is false when the SMS
    /// provider rejected it
    Replied {
        conversation_id: ConversationId,
        delivered: bool,
    },
}

/// Runs one inbound message through admission, history, completion,
/// persistence and delivery. Only a missing `From`/`To` is an error; every
/// later stage degrades on its own.
pub struct ExchangeCoordinator {
    admission: AdmissionDecider,
    history: Arc<dyn HistoryStore>,
    completion: CompletionOrchestrator,
    sms: Arc<dyn SmsSender>,
    reply_from: ReplyFrom,
    sending_number: String,
}

impl ExchangeCoordinator {
    pub fn new(
        admission: AdmissionDecider,
        history: Arc<dyn HistoryStore>,
        completion: CompletionOrchestrator,
        sms: Arc<dyn SmsSender>,
        reply_from: ReplyFrom,
        sending_number: String,
    ) -> Self {
        Self {
            admission,
            history,
            completion,
            sms,
            reply_from,
            sending_number,
        }
    }

    pub async fn handle(&self, sms: InboundSms) -> Result<ExchangeOutcome, ApiError> {
        let (Some(sender), Some(recipient)) = (sms.sender(), sms.recipient()) else {
            return Err(ApiError::BadRequest(format!(
                "Missing required fields in request: From={:?}, To={:?}",
                sms.from, sms.to
            )));
        };

        let (conversation_id, user_text) =
            match self.admission.decide(sender, sms.group_id(), &sms.body) {
                Admission::Ignore { conversation_id } => {
                    debug!(conversation = %conversation_id, "Group message not addressed to assistant, ignoring");
                    return Ok(ExchangeOutcome::Ignored { conversation_id });
                }
                Admission::Engage {
                    conversation_id,
                    text,
                } => (conversation_id, text),
            };

        info!(conversation = %conversation_id, user_msg = %user_text, "Processing message");

        let history = self.history.read(&conversation_id);
        let reply = self.completion.respond(&history, &user_text).await;

        self.history.append_exchange(
            &conversation_id,
            ChatMessage::user(user_text),
            ChatMessage::assistant(reply.clone()),
        );

        let from = match self.reply_from {
            ReplyFrom::Configured => self.sending_number.as_str(),
            ReplyFrom::Recipient => recipient,
        };

        let delivered = match self.sms.send(from, sender, &reply).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, to = %sender, "SMS send error");
                false
            }
        };

        Ok(ExchangeOutcome::Replied {
            conversation_id,
            delivered,
        })
    }
}
