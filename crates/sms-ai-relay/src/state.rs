use anyhow::Result;
use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::{
    AdmissionDecider, CompletionOrchestrator, ExchangeCoordinator, HistoryCache, LlmService,
    TwilioService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ExchangeCoordinator>,
    pub history: HistoryCache,
}

impl AppState {
    pub fn new(coordinator: Arc<ExchangeCoordinator>, history: HistoryCache) -> Self {
        Self { coordinator, history }
    }

    /// Wire the Twilio and OpenAI clients, the history cache and the
    /// coordinator from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let history = HistoryCache::new(settings.history.clone());

        let llm_service = Arc::new(LlmService::new(settings.openai.clone())?);
        let sms_service = Arc::new(TwilioService::new(settings.twilio.clone())?);

        let admission = AdmissionDecider::new(
            &settings.assistant.name,
            settings.assistant.default_greeting.clone(),
        )?;
        let completion = CompletionOrchestrator::new(llm_service, &settings.assistant);

        let coordinator = Arc::new(ExchangeCoordinator::new(
            admission,
            Arc::new(history.clone()),
            completion,
            sms_service,
            settings.twilio.reply_from,
            settings.twilio.phone_number.clone(),
        ));

        Ok(Self::new(coordinator, history))
    }
}

impl FromRef<AppState> for Arc<ExchangeCoordinator> {
    fn from_ref(state: &AppState) -> Self {
        state.coordinator.clone()
    }
}

impl FromRef<AppState> for HistoryCache {
    fn from_ref(state: &AppState) -> Self {
        state.history.clone()
    }
}
