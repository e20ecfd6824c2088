use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::llm::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Openai,
    Google,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Self::Openai, Self::Google, Self::Ollama];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }

    /// Environment variable holding the credential, if the provider needs one.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Ollama => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "google" | "gemini" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            _ => Err(Error::UnsupportedProvider(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn. Order within a conversation is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token counts as reported by the provider; zero when it reports nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: Option<u32>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total_tokens
                .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens)),
        }
    }
}

/// What a single provider variant hands back before timing and pricing.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallMetadata {
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost_usd: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ChatResult {
    pub response: String,
    pub metadata: CallMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Request {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} request timed out after {timeout_secs}s")]
    Timeout { provider: Provider, timeout_secs: u64 },
    #[error("{provider} API error {status}")]
    Api { provider: Provider, status: StatusCode },
    #[error("{provider} returned an unexpected response shape: {reason}")]
    UnexpectedShape { provider: Provider, reason: String },
    #[error("{provider} returned an empty response. Is a model being served at the configured host?")]
    EmptyResponse { provider: Provider },
}

/// Produces one chat completion from a message list.
///
/// Implementations own the wire format of a single provider; the shared
/// [`Transport`] owns the HTTP exchange.
pub trait ChatProvider {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    fn complete(&self, transport: &dyn Transport, messages: &[Message]) -> Result<Completion>;
}
