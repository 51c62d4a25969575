use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub twilio: TwilioConfig,
    pub openai: OpenAiConfig,
    pub assistant: AssistantConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Sending number used for replies
    #[serde(default)]
    pub phone_number: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub reply_from: ReplyFrom,
}

/// Which number an outbound reply is sent from.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFrom {
    /// Always the configured `twilio.phone_number`
    Configured,
    /// The number the inbound message was addressed to
    Recipient,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssistantConfig {
    /// Mention token that addresses the assistant in group chats
    pub name: String,
    pub system_prompt: String,
    pub fallback_reply: String,
    pub default_greeting: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    pub max_turns: usize,
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub max_conversations: usize,
    pub memory_limit_percent: f64,
}

impl HistoryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,                // ~10 full exchanges
            ttl_seconds: 24 * 60 * 60,    // 24 hours idle
            sweep_interval_seconds: 60 * 60,
            max_conversations: 100_000,
            memory_limit_percent: 100.0, // RAM guard off
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub directory: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Settings {
    /// Load from `.env`, `config/settings.toml`, `APP__SECTION__KEY`
    /// variables and the conventional flat Twilio/OpenAI variables, in
    /// increasing priority.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name("config/settings").required(false));
        let builder = Self::with_env(builder, std::env::vars().collect())?;

        Self::from_builder(builder)
    }

    /// Layer environment variables over `builder`: `APP__SECTION__KEY`
    /// first, then the flat variables, which win over everything.
    pub fn with_env(
        builder: ConfigBuilder<DefaultState>,
        vars: Map<String, String>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let flat = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        let account_sid = flat("TWILIO_ACCOUNT_SID");
        let auth_token = flat("TWILIO_AUTH_TOKEN");
        let phone_number = flat("TWILIO_PHONE_NUMBER");
        let api_key = flat("OPENAI_API_KEY");
        let port = flat("PORT");
        let log_format = flat("LOG_FORMAT");

        builder
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .source(Some(vars)),
            )
            .set_override_option("twilio.account_sid", account_sid)?
            .set_override_option("twilio.auth_token", auth_token)?
            .set_override_option("twilio.phone_number", phone_number)?
            .set_override_option("openai.api_key", api_key)?
            .set_override_option("server.port", port)?
            .set_override_option("logging.format", log_format)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let history = HistoryConfig::default();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("twilio.base_url", "https://api.twilio.com")?
            .set_default("twilio.timeout_seconds", 15)?
            .set_default("twilio.reply_from", "configured")?
            .set_default("openai.base_url", "https://api.openai.com/v1")?
            .set_default("openai.model", "gpt-4o-mini")?
            .set_default("openai.timeout_seconds", 30)?
            .set_default("assistant.name", "SamanthaAI")?
            .set_default(
                "assistant.system_prompt",
                "You are SamanthaAI, an SMS-friendly assistant.",
            )?
            .set_default("assistant.fallback_reply", "Sorry, something went wrong 🤖")?
            .set_default("assistant.default_greeting", "Hello!")?
            .set_default("history.max_turns", history.max_turns as i64)?
            .set_default("history.ttl_seconds", history.ttl_seconds as i64)?
            .set_default(
                "history.sweep_interval_seconds",
                history.sweep_interval_seconds as i64,
            )?
            .set_default("history.max_conversations", history.max_conversations as i64)?
            .set_default("history.memory_limit_percent", history.memory_limit_percent)?
            .set_default("logging.format", "json")?
            .set_default("logging.directory", "logs")
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Refuse to run without credentials or with a history store that
    /// cannot hold a single exchange.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let required = [
            ("TWILIO_ACCOUNT_SID", &self.twilio.account_sid),
            ("TWILIO_AUTH_TOKEN", &self.twilio.auth_token),
            ("TWILIO_PHONE_NUMBER", &self.twilio.phone_number),
            ("OPENAI_API_KEY", &self.openai.api_key),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if !missing.is_empty() {
            return Err(SettingsError::Missing(missing));
        }

        if self.history.max_turns < 2 {
            return Err(SettingsError::Invalid {
                key: "history.max_turns",
                reason: format!("must be at least 2, got {}", self.history.max_turns),
            });
        }

        if self.history.sweep_interval_seconds == 0 {
            return Err(SettingsError::Invalid {
                key: "history.sweep_interval_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.assistant.name.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "assistant.name",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> ConfigBuilder<DefaultState> {
        Settings::defaults()
            .unwrap()
            .set_override("twilio.account_sid", "AC123")
            .unwrap()
            .set_override("twilio.auth_token", "secret")
            .unwrap()
            .set_override("twilio.phone_number", "+15550001111")
            .unwrap()
            .set_override("openai.api_key", "sk-test")
            .unwrap()
    }

    #[test]
    fn test_defaults_with_credentials() {
        let settings = Settings::from_builder(with_credentials()).unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.twilio.reply_from, ReplyFrom::Configured);
        assert_eq!(settings.twilio.phone_number, "+15550001111");
        assert_eq!(settings.history.max_turns, 20);
        assert_eq!(settings.history.ttl(), Duration::from_secs(86_400));
        assert_eq!(settings.history.sweep_interval(), Duration::from_secs(3_600));
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_credentials_are_listed() {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("twilio.account_sid", "AC123")
            .unwrap();

        match Settings::from_builder(builder) {
            Err(SettingsError::Missing(keys)) => {
                assert_eq!(
                    keys,
                    vec!["TWILIO_AUTH_TOKEN", "TWILIO_PHONE_NUMBER", "OPENAI_API_KEY"]
                );
            }
            other => panic!("expected missing settings, got {:?}", other.map(|_| ())),
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
    }

    #[test]
    fn test_flat_env_vars_supply_credentials() {
        let builder = Settings::with_env(Settings::defaults().unwrap(), vars(&credentials())).unwrap();
        let settings = Settings::from_builder(builder).unwrap();

        assert_eq!(settings.twilio.account_sid, "AC123");
        assert_eq!(settings.twilio.auth_token, "secret");
        assert_eq!(settings.twilio.phone_number, "+15550001111");
        assert_eq!(settings.openai.api_key, "sk-test");
    }

    #[test]
    fn test_nested_app_env_vars() {
        let mut pairs = credentials();
        pairs.extend([
            ("APP__SERVER__PORT", "9000"),
            ("APP__HISTORY__MAX_TURNS", "30"),
            ("APP__OPENAI__MODEL", "gpt-4o"),
            ("APP__TWILIO__REPLY_FROM", "recipient"),
        ]);

        let builder = Settings::with_env(Settings::defaults().unwrap(), vars(&pairs)).unwrap();
        let settings = Settings::from_builder(builder).unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.history.max_turns, 30);
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.twilio.reply_from, ReplyFrom::Recipient);
    }

    #[test]
    fn test_flat_env_vars_win_over_nested() {
        let mut pairs = credentials();
        pairs.extend([
            ("APP__SERVER__PORT", "9000"),
            ("PORT", "8081"),
            ("APP__TWILIO__ACCOUNT_SID", "ACnested"),
            ("APP__LOGGING__FORMAT", "json"),
            ("LOG_FORMAT", "pretty"),
        ]);

        let builder = Settings::with_env(Settings::defaults().unwrap(), vars(&pairs)).unwrap();
        let settings = Settings::from_builder(builder).unwrap();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.twilio.account_sid, "AC123");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_flat_var_is_ignored() {
        let mut pairs = credentials();
        pairs.extend([("APP__SERVER__PORT", "9000"), ("PORT", "")]);

        let builder = Settings::with_env(Settings::defaults().unwrap(), vars(&pairs)).unwrap();
        assert_eq!(Settings::from_builder(builder).unwrap().server.port, 9000);
    }

    #[test]
    fn test_string_port_override() {
        let builder = with_credentials().set_override("server.port", "8081").unwrap();
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.server.port, 8081);
    }

    #[test]
    fn test_rejects_tiny_history() {
        let builder = with_credentials().set_override("history.max_turns", 1).unwrap();
        assert!(matches!(
            Settings::from_builder(builder),
            Err(SettingsError::Invalid { key: "history.max_turns", .. })
        ));
    }

    #[test]
    fn test_reply_from_recipient() {
        let builder = with_credentials()
            .set_override("twilio.reply_from", "recipient")
            .unwrap();
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.twilio.reply_from, ReplyFrom::Recipient);
    }
}
