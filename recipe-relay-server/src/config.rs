use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub frontend_origin: Option<String>,
    pub upstream_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY");
        match &api_key {
            Some(key) if key.starts_with("sk-") => info!("OpenAI API key loaded"),
            Some(_) => warn!("OPENAI_API_KEY doesn't start with 'sk-'. Please check your .env file"),
            None => warn!("OPENAI_API_KEY not set; generate requests will fail until it is"),
        }

        let bind_addr = get("RELAY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("RELAY_BIND_ADDR is not a socket address: {}", bind_addr))?;

        Ok(Self {
            api_key,
            frontend_origin: get("FRONTEND_ORIGIN"),
            upstream_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            bind_addr,
        })
    }

    /// One allowed origin when FRONTEND_ORIGIN is set, anything otherwise.
    pub fn cors_layer(&self) -> Result<CorsLayer> {
        match &self.frontend_origin {
            Some(origin) => {
                let origin = HeaderValue::from_str(origin)
                    .with_context(|| format!("FRONTEND_ORIGIN is not a valid origin: {}", origin))?;
                info!("CORS restricted to {:?}", origin);
                Ok(CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(Any)
                    .allow_headers(Any))
            }
            None => {
                info!("CORS allows any origin");
                Ok(CorsLayer::permissive())
            }
        }
    }
}
