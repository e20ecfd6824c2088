use std::time::Instant;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::llm::cost::cost;
use crate::llm::gemini::GeminiChat;
use crate::llm::ollama::OllamaChat;
use crate::llm::openai::OpenAiChat;
use crate::llm::provider::{CallMetadata, ChatProvider, ChatResult, Message, Provider};
use crate::llm::transport::{HttpTransport, Transport};

/// Provider-agnostic entry point: one `chat` call in, text plus metadata out.
pub struct ChatClient {
    provider: Box<dyn ChatProvider>,
    transport: Box<dyn Transport>,
}

impl ChatClient {
    pub fn new(provider: Box<dyn ChatProvider>, transport: Box<dyn Transport>) -> Self {
        Self {
            provider,
            transport,
        }
    }

    /// Builds the configured provider over a real HTTP transport.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = match settings.provider {
            Provider::Ollama => Some(settings.ollama_host.as_str()),
            Provider::Openai | Provider::Google => None,
        };
        let transport = HttpTransport::new(settings.timeout_secs, base_url)?;
        Ok(Self::with_transport(settings, Box::new(transport)))
    }

    pub fn with_transport(settings: &Settings, transport: Box<dyn Transport>) -> Self {
        Self::new(provider_for(settings), transport)
    }

    pub fn provider(&self) -> Provider {
        self.provider.provider()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn chat(&self, messages: &[Message]) -> Result<ChatResult> {
        if messages.is_empty() {
            return Err(Error::Configuration(
                "messages list cannot be empty".to_string(),
            ));
        }

        let provider = self.provider();
        let model = self.model();
        let span = tracing::info_span!("chat", provider = %provider, model = %model);
        let _enter = span.enter();
        tracing::debug!(messages = messages.len(), "sending chat request");

        let started = Instant::now();
        let completion = self
            .provider
            .complete(self.transport.as_ref(), messages)
            .inspect_err(|err| tracing::debug!(error = %err, "chat request failed"))?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let usage = completion.usage;
        let metadata = CallMetadata {
            provider: provider.as_str().to_string(),
            model: model.to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost_usd: cost(
                provider.as_str(),
                model,
                usage.prompt_tokens,
                usage.completion_tokens,
            ),
            duration_ms,
        };
        tracing::info!(
            prompt_tokens = metadata.prompt_tokens,
            completion_tokens = metadata.completion_tokens,
            total_tokens = metadata.total_tokens,
            cost_usd = metadata.cost_usd,
            duration_ms = metadata.duration_ms,
            "chat completed"
        );

        Ok(ChatResult {
            response: completion.text,
            metadata,
        })
    }
}

fn provider_for(settings: &Settings) -> Box<dyn ChatProvider> {
    match settings.provider {
        Provider::Openai => Box::new(OpenAiChat::new(
            &settings.model,
            settings.openai_api_key.clone(),
        )),
        Provider::Google => Box::new(GeminiChat::new(
            &settings.model,
            settings.google_api_key.clone(),
        )),
        Provider::Ollama => Box::new(OllamaChat::new(&settings.model, &settings.ollama_host)),
    }
}
