//! LLM client for semantic judgments and SQL generation.
//!
//! Supports two API formats:
//! - **Anthropic**: Claude API with `x-api-key` auth
//! - **OpenAI-compatible**: works with Ollama (the local default), OpenAI,
//!   vLLM, LiteLLM, Together, Groq, etc.
//!
//! With no provider configured, an Anthropic key selects Anthropic and its
//! absence falls back to a local Ollama endpoint, which needs no key.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Supported API providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

/// LLM configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub provider: LlmProvider,
}

impl LlmConfig {
    /// Load config from environment. Returns None when no usable provider is
    /// configured (Anthropic selected but no key).
    ///
    /// `RELGRAPH_LLM_PROVIDER` picks the provider:
    /// - `"openai"` → OpenAI-compatible mode; key optional (Ollama needs none)
    /// - `"anthropic"` → Anthropic mode; requires `ANTHROPIC_API_KEY`
    /// - unset → Anthropic when `ANTHROPIC_API_KEY` is present, otherwise
    ///   OpenAI-compatible against local Ollama
    pub fn from_env() -> Option<Self> {
        let provider_str = std::env::var("RELGRAPH_LLM_PROVIDER")
            .unwrap_or_default()
            .to_lowercase();

        let anthropic_key = std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());

        let (provider, api_key, default_model, default_url) = match provider_str.as_str() {
            "openai" => (
                LlmProvider::OpenAi,
                std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                "codellama:7b".to_string(),
                "http://localhost:11434/v1/chat/completions".to_string(),
            ),
            "anthropic" => (
                LlmProvider::Anthropic,
                anthropic_key?,
                "claude-3-5-sonnet-20241022".to_string(),
                "https://api.anthropic.com/v1/messages".to_string(),
            ),
            _ => match anthropic_key {
                Some(key) => (
                    LlmProvider::Anthropic,
                    key,
                    "claude-3-5-sonnet-20241022".to_string(),
                    "https://api.anthropic.com/v1/messages".to_string(),
                ),
                None => (
                    LlmProvider::OpenAi,
                    std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                    "codellama:7b".to_string(),
                    "http://localhost:11434/v1/chat/completions".to_string(),
                ),
            },
        };

        Some(Self {
            api_key,
            model: std::env::var("RELGRAPH_LLM_MODEL").unwrap_or(default_model),
            api_url: std::env::var("RELGRAPH_LLM_API_URL").unwrap_or(default_url),
            max_tokens: std::env::var("RELGRAPH_LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            provider,
        })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAi => "OpenAI-compatible",
        }
    }
}

// ── Anthropic API types ──

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    text: Option<String>,
}

// ── OpenAI-compatible API types ──

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// ── Shared types ──

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Call the LLM API with the given system and user prompts.
/// Dispatches to Anthropic or OpenAI-compatible format based on config.
pub async fn call_llm(
    client: &Client,
    config: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, LlmError> {
    log::debug!("Calling {} model {}", config.provider_name(), config.model);
    match config.provider {
        LlmProvider::Anthropic => call_anthropic(client, config, system_prompt, user_prompt).await,
        LlmProvider::OpenAi => call_openai(client, config, system_prompt, user_prompt).await,
    }
}

async fn call_anthropic(
    client: &Client,
    config: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, LlmError> {
    let request = AnthropicRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        system: system_prompt.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        }],
    };

    let response = client
        .post(&config.api_url)
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, body });
    }

    let msg: AnthropicResponse = response.json().await?;
    let text = msg
        .content
        .into_iter()
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

async fn call_openai(
    client: &Client,
    config: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, LlmError> {
    let request = OpenAiRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ],
    };

    let mut builder = client
        .post(&config.api_url)
        .header("content-type", "application/json");
    // Local endpoints (Ollama) take no key.
    if !config.api_key.is_empty() {
        builder = builder.header("authorization", format!("Bearer {}", config.api_key));
    }

    let response = builder.json(&request).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, body });
    }

    let msg: OpenAiResponse = response.json().await?;
    let text = msg
        .choices
        .into_iter()
        .filter_map(|c| c.message.content)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

/// Strip a markdown code fence (with or without a language tag) from an LLM
/// response, if present.
pub fn extract_fenced(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(body) = rest.strip_suffix("```") {
            // Drop the language tag line (```sql, ```json, ...), if any.
            let body = match body.split_once('\n') {
                Some((first_line, remainder)) if !first_line.trim().contains(' ') => remainder,
                _ => body,
            };
            return body.trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Pull the first JSON object out of free-form text: everything between the
/// first `{` and the last `}`. Naive by design; callers validate the parse.
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].to_string())
}

/// Pull the first JSON array out of free-form text, same strategy as
/// [`extract_json_object`].
pub fn extract_json_array(text: &str) -> Option<String> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].to_string())
}

lazy_static! {
    static ref SELECT_RE: Regex =
        Regex::new(r"(?is)\bSELECT\b.*?(?:;|\z)").expect("SELECT regex is valid");
}

/// Extract the first SELECT statement from an LLM response. Code fences are
/// stripped first; anything that is not a SELECT is rejected.
pub fn extract_select(response: &str) -> Option<String> {
    let body = extract_fenced(response);
    let matched = SELECT_RE.find(&body)?;
    let mut sql = matched.as_str().trim().to_string();
    if !sql.ends_with(';') {
        sql.push(';');
    }
    Some(sql)
}
