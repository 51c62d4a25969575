use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TwilioConfig;
use crate::services::exchange::SmsSender;
use crate::utils::error::ProviderError;

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Twilio Programmable Messaging REST client
#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Create an outbound message. Returns the message SID.
    pub async fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<String, ProviderError> {
        debug!("Sending SMS: to={}, body_len={}", to, body.len());

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| ProviderError::Sms(format!("Failed to call Twilio API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<TwilioErrorBody>().await {
                Ok(TwilioErrorBody { code, message }) => format!(
                    "code={} {}",
                    code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                    message.unwrap_or_default()
                ),
                Err(_) => String::new(),
            };
            return Err(ProviderError::Sms(format!(
                "Twilio API error: {} {}",
                status, detail
            )));
        }

        let message: MessageResource = response
            .json()
            .await
            .map_err(|e| ProviderError::Sms(format!("Failed to parse Twilio response: {}", e)))?;

        info!(
            "Message sent successfully: to={}, sid={}, status={}",
            to,
            message.sid,
            message.status.as_deref().unwrap_or("unknown")
        );
        Ok(message.sid)
    }
}

#[async_trait::async_trait]
impl SmsSender for TwilioService {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<()> {
        self.send_sms(from, to, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplyFrom;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> TwilioService {
        TwilioService::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            phone_number: "+15550001111".to_string(),
            base_url: server.uri(),
            timeout_seconds: 5,
            reply_from: ReplyFrom::Configured,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("From=%2B15550001111"))
            .and(body_string_contains("To=%2B15552223333"))
            .and(body_string_contains("Body=hello+there"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "sid": "SM001",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sid = service(&server)
            .send_sms("+15550001111", "+15552223333", "hello there")
            .await
            .unwrap();

        assert_eq!(sid, "SM001");
    }

    #[tokio::test]
    async fn test_rejected_message_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 21211,
                "message": "The 'To' number is not a valid phone number.",
                "status": 400
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .send("+15550001111", "not-a-number", "hi")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("21211"));
    }
}
