//! Provider-agnostic chat client.
//!
//! Three wire formats (chat-completions, `generateContent`, local Ollama) sit
//! behind [`ChatProvider`]; all of them share one blocking [`Transport`].

pub mod client;
pub mod cost;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod transport;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use client::ChatClient;
pub use provider::{
    CallMetadata, ChatProvider, ChatResult, Completion, Message, Provider, ProviderError, Role,
    Usage,
};
pub use transport::{Auth, HttpTransport, RequestFailure, Transport};

use crate::error::Result;

pub(crate) fn post(
    transport: &dyn Transport,
    provider: Provider,
    url: &str,
    auth: Auth<'_>,
    payload: &Value,
) -> Result<Value> {
    transport
        .post_json(url, auth, payload)
        .map_err(|failure| failure.into_provider_error(provider, transport.timeout_secs()).into())
}

pub(crate) fn decode_body<T: DeserializeOwned>(provider: Provider, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|err| {
        ProviderError::UnexpectedShape {
            provider,
            reason: err.to_string(),
        }
        .into()
    })
}
