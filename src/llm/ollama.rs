use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::llm::provider::{ChatProvider, Completion, Message, Provider, ProviderError, Usage};
use crate::llm::transport::{Auth, Transport};
use crate::llm::{decode_body, post};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for a locally served model. No credentials, no streaming.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    model: String,
    host: String,
}

impl OllamaChat {
    pub fn new(model: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            host: host.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.host.trim_end_matches('/'))
    }
}

impl ChatProvider for OllamaChat {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, transport: &dyn Transport, messages: &[Message]) -> Result<Completion> {
        let provider = self.provider();
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        let body = post(transport, provider, &self.endpoint(), Auth::None, &payload)?;
        let body: ChatResponse = decode_body(provider, body)?;

        // A reply without message content means nothing is serving the model.
        let text = body
            .message
            .and_then(|message| message.content)
            .ok_or(ProviderError::EmptyResponse { provider })?;
        let usage = Usage::new(
            body.prompt_eval_count.unwrap_or(0),
            body.eval_count.unwrap_or(0),
            None,
        );

        Ok(Completion { text, usage })
    }
}
