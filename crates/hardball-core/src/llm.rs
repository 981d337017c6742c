use std::future::Future;

use crate::config::LlmConfig;
use crate::error::{HardballError, Result};
use crate::model::{ChatMessage, ChatRole};

/// The conversational collaborator a session talks to. Given the context so
/// far and a new user message, produce the counterpart's reply.
pub trait ChatBackend: Send + Sync {
    fn reply(
        &self,
        credential: &str,
        context: &[ChatMessage],
        message: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Multi-turn chat over the hosted LLM providers.
pub struct LlmService {
    provider: LlmProvider,
    config: LlmConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for LlmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmService")
            .field("provider", &self.provider)
            .field("model", &self.config.model)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LlmProvider {
    Gemini,
    OpenAI,
    Anthropic,
    Ollama,
}

impl LlmService {
    /// Create an LLM service from configuration. The credential is supplied
    /// per call, so a missing key is not an error here.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = match config.provider.as_str() {
            "gemini" | "google" => LlmProvider::Gemini,
            "openai" => LlmProvider::OpenAI,
            "anthropic" | "claude" => LlmProvider::Anthropic,
            "ollama" => LlmProvider::Ollama,
            other => {
                return Err(HardballError::Config(format!(
                    "unknown LLM provider: '{other}' (expected 'gemini', 'openai', 'anthropic', or 'ollama')"
                )));
            }
        };

        Ok(Self {
            provider,
            config: config.clone(),
            client: reqwest::Client::new(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Ollama => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Gemini: POST {base_url}/v1beta/models/{model}:generateContent
    async fn chat_gemini(
        &self,
        api_key: &str,
        context: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            self.config.model,
        );

        let body = serde_json::json!({
            "contents": gemini_contents(context, message),
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let json = read_json(resp, "Gemini").await?;

        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| HardballError::Llm("Gemini response missing text".into()))
    }

    /// OpenAI: POST {base_url}/v1/chat/completions
    async fn chat_openai(
        &self,
        api_key: &str,
        context: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com");

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": role_content_messages(context, message),
            "max_tokens": self.config.max_tokens,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        let json = read_json(resp, "OpenAI").await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| HardballError::Llm("OpenAI response missing content".into()))
    }

    /// Anthropic: POST {base_url}/v1/messages
    async fn chat_anthropic(
        &self,
        api_key: &str,
        context: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com");

        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": role_content_messages(context, message),
        });

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json = read_json(resp, "Anthropic").await?;

        // {"content": [{"type": "text", "text": "..."}]}
        json["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| HardballError::Llm("Anthropic response missing text content".into()))
    }

    /// Ollama: POST {base_url}/api/chat. Local models take no key.
    async fn chat_ollama(&self, context: &[ChatMessage], message: &str) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("http://localhost:11434");

        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": role_content_messages(context, message),
            "stream": false,
            "options": {
                "num_predict": self.config.max_tokens,
            }
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?;

        let json = read_json(resp, "Ollama").await?;

        json["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| HardballError::Llm("Ollama response missing message content".into()))
    }
}

impl ChatBackend for LlmService {
    async fn reply(
        &self,
        credential: &str,
        context: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        tracing::debug!(
            provider = self.provider_name(),
            model = %self.config.model,
            context_len = context.len(),
            "sending negotiation turn"
        );
        let reply = match self.provider {
            LlmProvider::Gemini => self.chat_gemini(credential, context, message).await,
            LlmProvider::OpenAI => self.chat_openai(credential, context, message).await,
            LlmProvider::Anthropic => self.chat_anthropic(credential, context, message).await,
            LlmProvider::Ollama => self.chat_ollama(context, message).await,
        };
        if let Err(ref e) = reply {
            tracing::warn!(provider = self.provider_name(), error = %e, "LLM call failed");
        }
        reply
    }
}

async fn read_json(resp: reqwest::Response, provider: &str) -> Result<serde_json::Value> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(HardballError::Llm(format!(
            "{provider} LLM error {status}: {text}"
        )));
    }

    resp.json()
        .await
        .map_err(|e| HardballError::Llm(format!("{provider} response parse error: {e}")))
}

/// Gemini wants `contents: [{role: user|model, parts: [{text}]}]`.
fn gemini_contents(context: &[ChatMessage], message: &str) -> Vec<serde_json::Value> {
    context
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .chain(std::iter::once((ChatRole::User, message)))
        .map(|(role, text)| {
            let role = match role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            };
            serde_json::json!({"role": role, "parts": [{"text": text}]})
        })
        .collect()
}

/// OpenAI, Anthropic and Ollama share `messages: [{role: user|assistant, content}]`.
fn role_content_messages(context: &[ChatMessage], message: &str) -> Vec<serde_json::Value> {
    context
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .chain(std::iter::once((ChatRole::User, message)))
        .map(|(role, text)| {
            let role = match role {
                ChatRole::User => "user",
                ChatRole::Model => "assistant",
            };
            serde_json::json!({"role": role, "content": text})
        })
        .collect()
}
