use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipe_relay_shared::ErrorBody;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("OPENAI_API_KEY is not set on the server")]
    MissingApiKey,
    #[error("{detail}")]
    InvalidRequest { status: StatusCode, detail: String },
    /// Upstream answered with status >= 400; its body is passed through as-is.
    #[error("{body}")]
    Upstream { status: StatusCode, body: String },
    #[error("Invalid response format from OpenAI")]
    BadUpstreamFormat,
    #[error("Upstream request timed out")]
    UpstreamTimeout,
    #[error("Failed to reach upstream: {0}")]
    Transport(reqwest::Error),
}

impl RelayError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        RelayError::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidRequest { status, .. } => *status,
            RelayError::Upstream { status, .. } => *status,
            RelayError::BadUpstreamFormat => StatusCode::BAD_GATEWAY,
            RelayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::UpstreamTimeout
        } else {
            RelayError::Transport(e)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        }
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::MissingApiKey.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(RelayError::BadUpstreamFormat.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(RelayError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            RelayError::invalid("temperature: out of range").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let upstream = RelayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".to_string(),
        };
        assert_eq!(upstream.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_upstream_body_is_verbatim() {
        let raw = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        let err = RelayError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            body: raw.to_string(),
        };
        assert_eq!(err.to_string(), raw);
    }

    #[tokio::test]
    async fn test_into_response_uses_detail_body() {
        let response = RelayError::MissingApiKey.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.detail, "OPENAI_API_KEY is not set on the server");
    }
}
