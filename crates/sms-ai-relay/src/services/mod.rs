pub mod admission;
pub mod completion;
pub mod exchange;
pub mod history;
pub mod llm_service;
pub mod sms_service;

pub use admission::{Admission, AdmissionDecider};
pub use completion::{CompletionOrchestrator, LlmProvider};
pub use exchange::{ExchangeCoordinator, ExchangeOutcome, SmsSender};
pub use history::{HistoryCache, HistoryStore};
pub use llm_service::LlmService;
pub use sms_service::TwilioService;
