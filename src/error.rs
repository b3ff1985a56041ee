use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum TtsError {
    // I/O errors
    Io(std::io::Error),

    // Engine errors
    EngineNotFound(String),
    ScratchDirUnwritable(String),
    Synthesis {
        message: String,
        stderr: String,
        stdout: String,
    },
    VoiceList(String),

    // Request validation errors
    InvalidRequest(String),
    EmptyText,
    TextTooLong(usize),

    // Auth errors
    InvalidApiKey,
    RateLimited(Duration),

    // Request exceeded the configured timeout
    Timeout(Duration),

    // Storage and assets
    Storage(String),
    Template(String),

    // Internal errors
    TaskJoin(String),
    Unknown(String),
}

impl TtsError {
    /// Synthesis failure without captured process output
    pub fn synthesis(message: impl Into<String>) -> Self {
        TtsError::Synthesis {
            message: message.into(),
            stderr: String::new(),
            stdout: String::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TtsError::EmptyText | TtsError::TextTooLong(_) | TtsError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            TtsError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            TtsError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            TtsError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client
    fn public_message(&self) -> String {
        match self {
            TtsError::EmptyText
            | TtsError::TextTooLong(_)
            | TtsError::InvalidRequest(_)
            | TtsError::InvalidApiKey => self.to_string(),
            TtsError::RateLimited(wait) => format!(
                "Rate limit exceeded. Please retry after {} seconds.",
                wait.as_secs().max(1)
            ),
            TtsError::EngineNotFound(_)
            | TtsError::ScratchDirUnwritable(_)
            | TtsError::Synthesis { .. } => "Text-to-speech conversion failed".to_string(),
            TtsError::Timeout(_) => "Request timed out".to_string(),
            TtsError::VoiceList(_) => "Failed to list voices".to_string(),
            TtsError::Template(_) => "Template rendering failed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for TtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsError::Io(e) => write!(f, "I/O error: {}", e),
            TtsError::EngineNotFound(bin) => {
                write!(f, "TTS engine '{}' is not installed or not on PATH", bin)
            }
            TtsError::ScratchDirUnwritable(dir) => {
                write!(f, "Scratch directory is not writable: {}", dir)
            }
            TtsError::Synthesis { message, .. } => write!(f, "Synthesis failed: {}", message),
            TtsError::VoiceList(msg) => write!(f, "Voice listing failed: {}", msg),
            TtsError::InvalidRequest(msg) => write!(f, "{}", msg),
            TtsError::EmptyText => write!(f, "Text is required"),
            TtsError::TextTooLong(max) => {
                write!(f, "Text exceeds maximum length of {} characters", max)
            }
            TtsError::InvalidApiKey => write!(f, "Invalid API key"),
            TtsError::RateLimited(wait) => {
                write!(f, "Rate limit exceeded (retry after {:?})", wait)
            }
            TtsError::Timeout(limit) => write!(f, "Request timed out after {:?}", limit),
            TtsError::Storage(msg) => write!(f, "Storage error: {}", msg),
            TtsError::Template(msg) => write!(f, "Template error: {}", msg),
            TtsError::TaskJoin(msg) => write!(f, "Task execution error: {}", msg),
            TtsError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for TtsError {}

// Conversions
impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io(err)
    }
}

impl From<sqlx::Error> for TtsError {
    fn from(err: sqlx::Error) -> Self {
        TtsError::Storage(err.to_string())
    }
}

impl From<hound::Error> for TtsError {
    fn from(err: hound::Error) -> Self {
        TtsError::synthesis(format!("invalid output: {}", err))
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        TtsError::Unknown(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TtsError {
    fn from(err: tokio::task::JoinError) -> Self {
        TtsError::TaskJoin(err.to_string())
    }
}

// Axum integration
impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.public_message();

        match &self {
            TtsError::Synthesis {
                message,
                stderr,
                stdout,
            } => {
                tracing::error!(
                    stderr = %stderr.trim(),
                    stdout = %stdout.trim(),
                    "espeak-ng error: {}",
                    message
                );
            }
            _ if status.is_server_error() => {
                tracing::error!("Internal error: {}", self);
            }
            _ => {
                tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
            }
        }

        let mut response = (
            status,
            axum::Json(serde_json::json!({
                "error": message
            })),
        )
            .into_response();

        if let TtsError::RateLimited(wait) = &self {
            if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_empty_text_maps_to_bad_request() {
        let response = TtsError::EmptyText.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "Text is required"}));
    }

    #[tokio::test]
    async fn test_invalid_key_maps_to_unauthorized() {
        let response = TtsError::InvalidApiKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_synthesis_error_hides_engine_output() {
        let err = TtsError::Synthesis {
            message: "exit status 1".to_string(),
            stderr: "secret internal path /opt/voices".to_string(),
            stdout: String::new(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Text-to-speech conversion failed");
        assert!(!body.to_string().contains("/opt/voices"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_request_timeout() {
        let response = TtsError::Timeout(Duration::from_secs(60)).into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "Request timed out"}));
    }

    #[tokio::test]
    async fn test_storage_error_is_opaque() {
        let response = TtsError::Storage("database is locked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_template_error_message() {
        let response = TtsError::Template("index.html missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Template rendering failed");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = TtsError::RateLimited(Duration::from_secs(3)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "3");
    }

    #[test]
    fn test_rate_limited_sub_second_rounds_up() {
        let response = TtsError::RateLimited(Duration::from_millis(200)).into_response();
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = TtsError::EngineNotFound("espeak-ng".to_string());
        assert!(err.to_string().contains("espeak-ng"));
    }
}
