use serde::{Deserialize, Serialize};
use std::fmt;

// ===== CONVERSATION MODELS =====

/// Key selecting one history log: the sender address for one-to-one chats,
/// or the group/thread identifier for group chats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message. Stored history only ever holds `User` and
/// `Assistant` turns; `System` appears in composed prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ===== REQUEST MODELS =====

/// Twilio inbound message webhook (form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundSms {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub conversation_sid: Option<String>,
    #[serde(default)]
    pub group_sid: Option<String>,
}

impl InboundSms {
    pub fn sender(&self) -> Option<&str> {
        non_empty(self.from.as_deref())
    }

    pub fn recipient(&self) -> Option<&str> {
        non_empty(self.to.as_deref())
    }

    /// Group/thread identifier, `ConversationSid` taking precedence.
    pub fn group_id(&self) -> Option<&str> {
        non_empty(self.conversation_sid.as_deref())
            .or_else(|| non_empty(self.group_sid.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
