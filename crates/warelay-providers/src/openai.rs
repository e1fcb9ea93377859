//! OpenAI-compatible completion provider.
//!
//! One request per inbound message: the configured style directive as the
//! system message, the message body as the user message. No retry and no
//! explicit timeout; a failed or hung call affects only that message's
//! reply, and the gateway substitutes an apology on error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warelay_core::config::ProviderConfig;
use warelay_core::error::RelayError;
use warelay_core::traits::Provider;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Provider speaking the OpenAI chat-completions API.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    style_directive: String,
}

impl OpenAiProvider {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            style_directive: config.style_directive.clone(),
        }
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.style_directive.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String, RelayError> {
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RelayError::Provider("completion response had no choices".into()))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RelayError> {
        // The key is read from the environment at startup; absence fails
        // here, at first use, not at startup.
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::Provider("OPENAI_API_KEY is not set".into()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt);
        debug!("completion request: model={} url={url}", self.model);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::Provider(format!("completion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(RelayError::Provider(format!(
                "completion API returned {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| RelayError::Provider(format!("completion response unparsable: {e}")))?;

        Self::extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_key() -> OpenAiProvider {
        let config = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        };
        OpenAiProvider::from_config(&config)
    }

    #[test]
    fn test_build_request_shape() {
        let provider = provider_with_key();
        let request = provider.build_request("hello there");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "hello there");

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["model"].is_string());
        assert!(json["temperature"].is_number());
    }

    #[test]
    fn test_extract_text_happy_path() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hi!"}}]}"#,
        )
        .unwrap();
        assert_eq!(OpenAiProvider::extract_text(response).unwrap(), "hi!");
    }

    #[test]
    fn test_extract_text_empty_choices_is_provider_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = OpenAiProvider::extract_text(response).unwrap_err();
        assert!(matches!(err, RelayError::Provider(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_first_use() {
        let provider = OpenAiProvider::from_config(&ProviderConfig::default());
        let err = provider.complete("hello").await.unwrap_err();
        assert!(matches!(err, RelayError::Provider(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ProviderConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..ProviderConfig::default()
        };
        let provider = OpenAiProvider::from_config(&config);
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
    }
}
