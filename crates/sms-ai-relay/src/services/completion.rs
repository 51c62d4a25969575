use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::AssistantConfig;
use crate::models::chat::ChatMessage;

/// Trait for LLM service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Builds the prompt for one reply and turns every provider failure into
/// the fallback reply, so callers always get text to send.
#[derive(Clone)]
pub struct CompletionOrchestrator {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    fallback_reply: String,
}

impl CompletionOrchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, assistant: &AssistantConfig) -> Self {
        Self {
            provider,
            system_prompt: assistant.system_prompt.clone(),
            fallback_reply: assistant.fallback_reply.clone(),
        }
    }

    pub fn fallback_reply(&self) -> &str {
        &self.fallback_reply
    }

    /// System directive, then history in order, then the new user turn.
    /// `history` is expected to be bounded already.
    pub fn build_prompt(&self, history: &[ChatMessage], user_text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_text));
        messages
    }

    /// Single attempt, no retry
    pub async fn respond(&self, history: &[ChatMessage], user_text: &str) -> String {
        let messages = self.build_prompt(history, user_text);

        match self.provider.generate(&messages).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    error!(prompt_messages = messages.len(), "LLM returned an empty completion");
                    return self.fallback_reply.clone();
                }
                debug!(reply_len = text.len(), "Completion received");
                text.to_string()
            }
            Err(e) => {
                error!(
                    error = %e,
                    prompt_messages = messages.len(),
                    "LLM completion failed, using fallback reply"
                );
                self.fallback_reply.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    fn assistant() -> AssistantConfig {
        AssistantConfig {
            name: "SamanthaAI".to_string(),
            system_prompt: "You are SamanthaAI, an SMS-friendly assistant.".to_string(),
            fallback_reply: "Sorry, something went wrong 🤖".to_string(),
            default_greeting: "Hello!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_prompt_order_and_trimmed_reply() {
        let mut provider = MockLlmProvider::new();
        provider
            .expect_generate()
            .withf(|messages| {
                messages.len() == 4
                    && messages[0].role == Role::System
                    && messages[1] == ChatMessage::user("earlier")
                    && messages[2] == ChatMessage::assistant("reply")
                    && messages[3] == ChatMessage::user("now")
            })
            .times(1)
            .returning(|_| Ok("  sure thing \n".to_string()));

        let orchestrator = CompletionOrchestrator::new(Arc::new(provider), &assistant());
        let history = [ChatMessage::user("earlier"), ChatMessage::assistant("reply")];

        assert_eq!(orchestrator.respond(&history, "now").await, "sure thing");
    }

    #[tokio::test]
    async fn test_failure_returns_fallback() {
        let mut provider = MockLlmProvider::new();
        provider
            .expect_generate()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let orchestrator = CompletionOrchestrator::new(Arc::new(provider), &assistant());

        assert_eq!(
            orchestrator.respond(&[], "Hi").await,
            "Sorry, something went wrong 🤖"
        );
    }

    #[tokio::test]
    async fn test_blank_completion_returns_fallback() {
        let mut provider = MockLlmProvider::new();
        provider.expect_generate().returning(|_| Ok("   ".to_string()));

        let orchestrator = CompletionOrchestrator::new(Arc::new(provider), &assistant());

        assert_eq!(orchestrator.respond(&[], "Hi").await, orchestrator.fallback_reply());
    }

    #[test]
    fn test_build_prompt_with_empty_history() {
        let orchestrator = CompletionOrchestrator::new(Arc::new(MockLlmProvider::new()), &assistant());
        let prompt = orchestrator.build_prompt(&[], "Hi");

        assert_eq!(
            prompt,
            vec![
                ChatMessage::system("You are SamanthaAI, an SMS-friendly assistant."),
                ChatMessage::user("Hi"),
            ]
        );
    }
}
