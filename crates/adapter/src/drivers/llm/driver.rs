use anyhow::Context;
use async_trait::async_trait;
use domain::GenerationError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::traits::TextGenerator;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// OpenAI 兼容的 chat completions 接口
#[derive(Clone)]
pub struct ChatCompletionsConfig {
    pub api_url: String,
    /// 本地后端 (如 Ollama) 可不设置
    pub api_key: Option<String>,
}

pub struct ChatCompletionsDriver {
    config: ChatCompletionsConfig,
    http: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl ChatCompletionsDriver {
    pub fn new(config: ChatCompletionsConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build LLM HTTP client")?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsDriver {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut req = self.http.post(&self.config.api_url).json(&payload);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let reply: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::Empty)?;

        debug!("LLM generated replacement: {}...", text.chars().take(100).collect::<String>());
        Ok(text)
    }
}
