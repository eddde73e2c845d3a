use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{GenerationFailure, GenerationFailureKind, TextCompletion};
use crate::config::GenerativeSettings;

/// Blocking client for an Azure OpenAI chat-completions deployment.
#[derive(Debug)]
pub struct AzureChatClient {
    http: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureChatClient {
    pub fn from_settings(settings: &GenerativeSettings) -> Result<Self, GenerationFailure> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|error| {
                GenerationFailure::new(
                    GenerationFailureKind::Transport,
                    format!("failed to build http client: {error}"),
                )
            })?;

        Ok(Self {
            http,
            url: chat_completions_url(
                &settings.endpoint,
                &settings.deployment,
                &settings.api_version,
            ),
            api_key: settings.api_key.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TextCompletion for AzureChatClient {
    fn complete(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let body = json!({
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
        });

        let response = self
            .http
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|error| {
                GenerationFailure::new(
                    GenerationFailureKind::Transport,
                    format!("chat completion request failed: {error}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GenerationFailure::new(
                GenerationFailureKind::Status,
                format!("chat completion returned HTTP {status}: {}", text.trim()),
            ));
        }

        let parsed: ChatCompletionResponse = response.json().map_err(|error| {
            GenerationFailure::new(
                GenerationFailureKind::MalformedResponse,
                format!("failed to decode chat completion: {error}"),
            )
        })?;

        parse_completion(parsed)
    }
}

fn parse_completion(response: ChatCompletionResponse) -> Result<String, GenerationFailure> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            GenerationFailure::new(
                GenerationFailureKind::EmptyCompletion,
                "chat completion contained no message content",
            )
        })
}

#[must_use]
pub fn chat_completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}
