use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::llm::provider::{ChatProvider, Completion, Message, Provider, ProviderError, Usage};
use crate::llm::transport::{Auth, Transport};
use crate::llm::{decode_body, post};

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// Chat-completions client: bearer auth, deterministic temperature.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    model: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
        }
    }
}

impl ChatProvider for OpenAiChat {
    fn provider(&self) -> Provider {
        Provider::Openai
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, transport: &dyn Transport, messages: &[Message]) -> Result<Completion> {
        let provider = self.provider();
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0,
        });
        let body = post(
            transport,
            provider,
            OPENAI_CHAT_COMPLETIONS_URL,
            Auth::Bearer(api_key),
            &payload,
        )?;
        let body: ChatCompletionResponse = decode_body(provider, body)?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::UnexpectedShape {
                provider,
                reason: "missing choices[0].message.content".to_string(),
            })?;
        let usage = body
            .usage
            .map(|usage| {
                Usage::new(
                    usage.prompt_tokens.unwrap_or(0),
                    usage.completion_tokens.unwrap_or(0),
                    usage.total_tokens,
                )
            })
            .unwrap_or_default();

        Ok(Completion { text, usage })
    }
}
