use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::llm::provider::{Provider, ProviderError};

/// How a request authenticates against the provider.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    Header { name: &'static str, value: &'a str },
}

#[derive(Debug)]
pub enum RequestFailure {
    Request(reqwest::Error),
    Timeout,
    Api { status: StatusCode },
    Decode(String),
}

impl RequestFailure {
    pub(crate) fn into_provider_error(
        self,
        provider: Provider,
        timeout_secs: u64,
    ) -> ProviderError {
        match self {
            Self::Request(source) => ProviderError::Request { provider, source },
            Self::Timeout => ProviderError::Timeout {
                provider,
                timeout_secs,
            },
            Self::Api { status } => ProviderError::Api { provider, status },
            Self::Decode(reason) => ProviderError::UnexpectedShape { provider, reason },
        }
    }
}

/// Blocking JSON POST shared by every provider variant.
///
/// Implementations must fail on non-2xx statuses and must not log the
/// payload or the response body.
pub trait Transport {
    fn timeout_secs(&self) -> u64;

    fn post_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        payload: &Value,
    ) -> Result<Value, RequestFailure>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64, base_url: Option<&str>) -> Result<Self> {
        let timeout_secs = timeout_secs.max(1);
        let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));
        if base_url.is_some_and(is_loopback_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|err| Error::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

impl Transport for HttpTransport {
    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn post_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        payload: &Value,
    ) -> Result<Value, RequestFailure> {
        let mut request = self.client.post(url).json(payload);
        request = match auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Header { name, value } => request.header(name, value),
        };

        let response = request.send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailure::Api { status });
        }

        // The body read shares the request deadline.
        let body = response.bytes().map_err(classify)?;
        serde_json::from_slice(&body)
            .map_err(|_| RequestFailure::Decode("response body is not valid JSON".to_string()))
    }
}

fn classify(err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        RequestFailure::Timeout
    } else {
        RequestFailure::Request(err)
    }
}

fn is_loopback_url(url: &str) -> bool {
    url.contains("://127.0.0.1") || url.contains("://localhost") || url.contains("://[::1]")
}
