pub mod chat;

pub use chat::{ChatMessage, ConversationId, InboundSms, Role};
