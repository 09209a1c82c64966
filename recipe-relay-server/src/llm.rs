use crate::config::Config;
use crate::error::RelayError;
use recipe_relay_shared::{ChatMessage, ChatRequest, ChatResponse};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Body sent to the completions endpoint, built fresh for every request.
#[derive(Debug, Serialize)]
struct UpstreamPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

impl<'a> UpstreamPayload<'a> {
    fn from_request(request: &'a ChatRequest) -> Self {
        Self {
            model: request.effective_model(),
            messages: &request.messages,
            temperature: request.temperature,
        }
    }
}

pub struct LlmService {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl LlmService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_timeout(config, UPSTREAM_TIMEOUT)
    }

    pub fn with_timeout(config: &Config, timeout: Duration) -> anyhow::Result<Self> {
        info!("Initializing LLM service against {}", config.upstream_url);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.upstream_url.clone(),
        })
    }

    /// Fails with the configuration error when no credential was provided at startup.
    pub fn api_key(&self) -> Result<&str, RelayError> {
        self.api_key.as_deref().ok_or(RelayError::MissingApiKey)
    }

    /// Forwards one chat request upstream and unwraps `choices[0].message.content`.
    ///
    /// The request must already be validated; this makes exactly one outbound call.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, RelayError> {
        let api_key = self.api_key()?;
        let payload = UpstreamPayload::from_request(request);
        debug!(
            "Forwarding {} messages to model {} (temperature {})",
            payload.messages.len(),
            payload.model,
            payload.temperature
        );

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if status.as_u16() >= 400 {
            // Passed through unredacted; it may expose upstream details to the caller.
            let body = res.text().await?;
            warn!("Upstream returned {}: {}", status, body);
            return Err(RelayError::Upstream { status, body });
        }

        let body = res.text().await?;
        let content = extract_content(&body)?;
        Ok(ChatResponse { content })
    }
}

fn extract_content(body: &str) -> Result<String, RelayError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        error!("Upstream body is not JSON: {}", e);
        RelayError::BadUpstreamFormat
    })?;

    match json["choices"][0]["message"]["content"].as_str() {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => {
            error!("Upstream response has no usable content: {}", body);
            Err(RelayError::BadUpstreamFormat)
        }
    }
}
