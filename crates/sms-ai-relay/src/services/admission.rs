use regex::Regex;

use crate::models::chat::ConversationId;

/// Outcome of deciding whether an inbound message gets a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Process the message
    Engage {
        conversation_id: ConversationId,
        text: String,
    },
    /// Group message not addressed to the assistant
    Ignore { conversation_id: ConversationId },
}

/// Decides whether to engage with a message and extracts the user text.
/// One-to-one messages are always answered; group messages only when they
/// start with the assistant's name, e.g. `SamanthaAI: ...`.
#[derive(Debug, Clone)]
pub struct AdmissionDecider {
    prefix: Regex,
    default_greeting: String,
}

impl AdmissionDecider {
    pub fn new(assistant_name: &str, default_greeting: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = format!(r"(?i)^{}[:,]?\s*", regex::escape(assistant_name.trim()));
        Ok(Self {
            prefix: Regex::new(&pattern)?,
            default_greeting: default_greeting.into(),
        })
    }

    pub fn decide(&self, sender: &str, group_id: Option<&str>, body: &str) -> Admission {
        let Some(group_id) = group_id else {
            return Admission::Engage {
                conversation_id: ConversationId::new(sender),
                text: self.effective_text(body),
            };
        };

        let conversation_id = ConversationId::new(group_id);
        match self.prefix.find(body) {
            Some(mention) => Admission::Engage {
                conversation_id,
                text: self.effective_text(&body[mention.end()..]),
            },
            None => Admission::Ignore { conversation_id },
        }
    }

    fn effective_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.default_greeting.clone()
        } else {
            trimmed.to_string()
        }
    }
}
