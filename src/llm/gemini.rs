use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::llm::provider::{
    ChatProvider, Completion, Message, Provider, ProviderError, Role, Usage,
};
use crate::llm::transport::{Auth, Transport};
use crate::llm::{decode_body, post};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// One turn in the `generateContent` wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    pub text: String,
}

impl Content {
    fn text(role: &'static str, text: String) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

/// Rewrites a role-tagged conversation into alternating user/model turns.
///
/// The wire format has no system role. The most recent system message is
/// buffered and prepended to the next user turn, then the buffer is cleared,
/// so each buffered system text is used at most once. Assistant messages
/// become `model` turns. A system message with no user turn after it is
/// dropped.
pub fn to_contents(messages: &[Message]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(messages.len());
    let mut pending_system: Option<&str> = None;

    for message in messages {
        match message.role {
            Role::System => pending_system = Some(&message.content),
            Role::User => {
                let text = match pending_system.take() {
                    Some(system) if !system.is_empty() => {
                        format!("{system}\n\n{}", message.content)
                    }
                    _ => message.content.clone(),
                };
                contents.push(Content::text("user", text));
            }
            Role::Assistant => contents.push(Content::text("model", message.content.clone())),
        }
    }

    contents
}

#[derive(Debug, Clone)]
pub struct GeminiChat {
    model: String,
    api_key: Option<String>,
}

impl GeminiChat {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model)
    }
}

impl ChatProvider for GeminiChat {
    fn provider(&self) -> Provider {
        Provider::Google
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
            .ok_or_else(|| Error::Configuration("GOOGLE_API_KEY is not set".to_string()))?;

        let payload = json!({
            "contents": to_contents(messages),
            "generationConfig": {"temperature": 0},
        });
        let body = post(
            transport,
            provider,
            &self.endpoint(),
            Auth::Header {
                name: API_KEY_HEADER,
                value: api_key,
            },
            &payload,
        )?;
        let body: GenerateContentResponse = decode_body(provider, body)?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| ProviderError::UnexpectedShape {
                provider,
                reason: "missing candidates[0].content.parts[0].text".to_string(),
            })?;
        let usage = body
            .usage_metadata
            .map(|usage| {
                Usage::new(
                    usage.prompt_token_count.unwrap_or(0),
                    usage.candidates_token_count.unwrap_or(0),
                    usage.total_token_count,
                )
            })
            .unwrap_or_default();

        Ok(Completion { text, usage })
    }
}
