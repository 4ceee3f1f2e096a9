//! Minimal client for an OpenAI-compatible chat completions endpoint.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::config::OpenAiConfig;

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Send one system + user exchange and return the trimmed reply text.
    pub async fn complete(&self, system_prompt: &str, message: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": message }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "chat completion failed with HTTP {}",
            response.status()
        );

        let json: Value = response
            .json()
            .await
            .context("chat completion response is not JSON")?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("chat completion response has no message content")?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "sk-test".into(),
            base_url,
            ..OpenAiConfig::default()
        }
    }

    #[tokio::test]
    async fn returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-3.5-turbo", "max_tokens": 150})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  You've got this.\n"}}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(server.uri()));
        let reply = client.complete("system", "hi").await.unwrap();
        assert_eq!(reply, "You've got this.");
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(server.uri()));
        assert!(client.complete("system", "hi").await.is_err());
    }
}
