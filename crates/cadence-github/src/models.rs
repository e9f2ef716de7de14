//! GitHub Models chat completions client.

use std::time::Duration;

use cadence_config::SummaryConfig;
use cadence_core::{Prompt, RemoteError, TextGenerator};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::releases::unexpected_status;
use crate::{GithubError, GithubResult};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ModelsClient {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    temperature: f32,
    token: String,
}

impl ModelsClient {
    /// Creates a client from the summary configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(config: &SummaryConfig, token: impl Into<String>) -> GithubResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| GithubError::InvalidUrl(format!("{}: {e}", config.endpoint)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GithubError::Client)?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            token: token.into(),
        })
    }

    /// Sends one completion request and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::RateLimited`] on 429, [`GithubError::Status`] on
    /// any other non-success status, and [`GithubError::InvalidResponse`] when
    /// the reply carries no text.
    pub async fn complete(&self, prompt: &Prompt) -> GithubResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: prompt.max_tokens,
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| GithubError::Request {
                url: self.endpoint.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(unexpected_status(&self.endpoint, response).await);
        }

        let reply: ChatResponse = response.json().await.map_err(|e| GithubError::InvalidResponse {
            url: self.endpoint.to_string(),
            reason: e.to_string(),
        })?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GithubError::InvalidResponse {
                url: self.endpoint.to_string(),
                reason: "no completion choices".to_string(),
            })
    }
}

impl TextGenerator for ModelsClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, RemoteError> {
        self.complete(prompt).await.map_err(Into::into)
    }
}
