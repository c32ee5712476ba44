//! Chat-completions client for Perplexity and OpenAI-compatible endpoints.

use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use worldthink_common::{Result, WorldThinkError};
use worldthink_http::{HttpClient, HttpError};

pub const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai/";
const COMPLETIONS_PATH: &str = "chat/completions";

/// Sampling and search knobs sent alongside every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub top_p: Option<f32>,
    /// Perplexity only: how fresh the online sources must be ("day", "week", "month"...).
    pub search_recency_filter: Option<String>,
    /// Send the Perplexity-specific fields (`return_images`, `search_domain_filter`...).
    pub perplexity_extras: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            top_p: Some(0.9),
            search_recency_filter: Some("month".to_string()),
            perplexity_extras: true,
        }
    }
}

impl ChatOptions {
    /// Plain OpenAI-compatible request: no Perplexity extras.
    pub fn openai() -> Self {
        Self {
            top_p: None,
            search_recency_filter: None,
            perplexity_extras: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_related_questions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One element of the `choices` array.
#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

pub struct PerplexityClient {
    client: HttpClient,
    api_key: String,
    model: String,
    options: ChatOptions,
}

impl PerplexityClient {
    /// Create a client for the public Perplexity API.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, PERPLEXITY_API_BASE)
    }

    /// Create a client against any chat-completions compatible base URL.
    pub fn with_endpoint(api_key: String, model: String, endpoint: &str) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| WorldThinkError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            options: ChatOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Bound every request; without this the transport default applies.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    fn build_request<'a>(
        &'a self,
        prompt: &'a str,
        system_prompt: Option<&'a str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let extras = self.options.perplexity_extras;
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
            top_p: self.options.top_p,
            max_tokens,
            return_images: extras.then_some(false),
            return_related_questions: extras.then_some(false),
            search_domain_filter: extras.then(Vec::new),
            search_recency_filter: if extras {
                self.options.search_recency_filter.as_deref()
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl LlmClient for PerplexityClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = self.build_request(prompt, system_prompt, max_tokens, temperature);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "llm.chat.request");

        let resp: ChatCompletionResponse = self
            .client
            .post_json(COMPLETIONS_PATH, Some(&self.api_key), &req)
            .await
            .map_err(http_to_worldthink)?;

        tracing::debug!(
            id = %resp.id,
            choices = resp.choices.len(),
            finish_reason = ?resp.choices.first().and_then(|c| c.finish_reason.as_deref()),
            "llm.chat.response"
        );

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                WorldThinkError::MalformedResponse("response contained no choices".to_string())
            })?;

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .generate("Respond with just 'OK'", None, Some(5), Some(0.1))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Perplexity health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn http_to_worldthink(e: HttpError) -> WorldThinkError {
    match e {
        HttpError::Api {
            status, message, ..
        } => WorldThinkError::transport(Some(status.as_u16()), message),
        HttpError::Network(message) => WorldThinkError::transport(None, message),
        HttpError::Decode(err, snippet) => WorldThinkError::MalformedResponse(format!(
            "unexpected response envelope: {err} ({snippet})"
        )),
        HttpError::Url(message) | HttpError::Build(message) => WorldThinkError::Config(message),
    }
}
