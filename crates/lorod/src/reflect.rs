//! Upstream reflection generation over an OpenAI-compatible chat API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use loro_core::config::ServerConfig;

pub const SYSTEM_PROMPT: &str = "You are a supportive, evidence-informed reflection helper. \
Summarize the user's journal entry in 2\u{2013}3 sentences, note feelings, \
and suggest one gentle, concrete next step. Avoid clinical diagnoses.";

#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Produces a short reflection on a journal entry.
#[async_trait]
pub trait Reflector: Send + Sync {
    /// Reflection text, possibly empty when the upstream had nothing to say.
    async fn reflect(&self, entry: &str) -> Result<String, ReflectError>;

    fn model(&self) -> &str;

    /// Confirm the API key works; returns how many models it can see.
    async fn check_key(&self) -> Result<usize, ReflectError>;

    /// Identifying prefix of the API key, safe to show
    fn key_hint(&self) -> String;
}

/// First eight characters of `key` followed by `...`
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}...")
}

pub struct OpenAiReflector {
    client: reqwest::Client,
    endpoint: String,
    models_endpoint: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

impl OpenAiReflector {
    pub fn new(config: &ServerConfig, api_key: SecretString) -> Result<Self, ReflectError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base = config.api_base.trim_end_matches('/');
        Ok(Self {
            client,
            endpoint: format!("{base}/chat/completions"),
            models_endpoint: format!("{base}/models"),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[async_trait]
impl Reflector for OpenAiReflector {
    async fn reflect(&self, entry: &str) -> Result<String, ReflectError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: entry,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReflectError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        Ok(first_content(reply))
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn check_key(&self) -> Result<usize, ReflectError> {
        let response = self
            .client
            .get(&self.models_endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReflectError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let models: ModelList = response.json().await?;
        Ok(models.data.len())
    }

    fn key_hint(&self) -> String {
        redact_key(self.api_key.expose_secret())
    }
}

fn first_content(reply: ChatResponse) -> String {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "rough day",
                },
            ],
            temperature: 0.4,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "rough day");
    }

    #[test]
    fn test_first_content_trims() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  You sound tired.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(reply), "You sound tired.");
    }

    #[test]
    fn test_first_content_missing_is_empty() {
        let reply: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_content(reply), "");
        let reply: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(first_content(reply), "");
    }

    #[test]
    fn test_redact_key() {
        assert_eq!(redact_key("sk-abcdefghijklmnop"), "sk-abcde...");
        assert_eq!(redact_key("short"), "short...");
        assert_eq!(redact_key(""), "...");
    }

    #[test]
    fn test_model_list_count() {
        let list: ModelList =
            serde_json::from_str(r#"{"object":"list","data":[{"id":"a"},{"id":"b"}]}"#).unwrap();
        assert_eq!(list.data.len(), 2);
        let list: ModelList = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn test_endpoint_joins_base() {
        let config = ServerConfig {
            api_base: "https://api.example.org/v1/".into(),
            ..Default::default()
        };
        let reflector = OpenAiReflector::new(&config, SecretString::from("sk-test")).unwrap();
        assert_eq!(reflector.endpoint, "https://api.example.org/v1/chat/completions");
        assert_eq!(reflector.models_endpoint, "https://api.example.org/v1/models");
        assert_eq!(reflector.key_hint(), "sk-test...");
        assert_eq!(reflector.model(), "gpt-4o-mini");
    }
}
