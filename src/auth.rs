use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::TtsError;
use crate::keystore::{fingerprint, KeyStore};
use crate::utils::header_utils::extract_api_key;

/// Middleware guarding routes that require a valid API key
///
/// Missing, unknown, inactive and stale keys all short-circuit with 401.
/// A successful check refreshes the key's last-used timestamp.
pub async fn auth_middleware(
    State(keys): State<KeyStore>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let api_key = match extract_api_key(&headers) {
        Some(key) => key,
        None => {
            tracing::debug!(path = %request.uri().path(), "Request without API key");
            return TtsError::InvalidApiKey.into_response();
        }
    };

    match keys.validate_and_touch(&api_key).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::warn!(
                key_fingerprint = %fingerprint(&api_key),
                path = %request.uri().path(),
                "Rejected API key"
            );
            TtsError::InvalidApiKey.into_response()
        }
        Err(e) => e.into_response(),
    }
}
