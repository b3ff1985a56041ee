use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Extract API key from HTTP headers
///
/// Reads the `X-API-Key` header, falling back to `Authorization: Bearer`.
/// X-API-Key takes precedence if both are present. Blank values count as absent.
///
/// # Examples
///
/// ```
/// use axum::http::HeaderMap;
/// use espeak_tts_server::utils::header_utils::extract_api_key;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-api-key", "my-secret-key".parse().unwrap());
/// assert_eq!(extract_api_key(&headers), Some("my-secret-key".to_string()));
/// ```
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key") {
        if let Ok(key_str) = key.to_str() {
            let key_str = key_str.trim();
            if !key_str.is_empty() {
                return Some(key_str.to_string());
            }
        }
    }

    if let Some(auth) = headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(stripped) = auth_str.strip_prefix("Bearer ") {
                let stripped = stripped.trim();
                if !stripped.is_empty() {
                    return Some(stripped.to_string());
                }
            }
        }
    }

    None
}

/// Client address for logging and rate limiting
///
/// The connection's peer address is authoritative. `X-Forwarded-For` (first
/// hop) and `X-Real-IP` are only honoured when `trust_proxy` is set, since
/// any client can send them.
pub fn extract_client_ip(req: &Request, trust_proxy: bool) -> Option<IpAddr> {
    if trust_proxy {
        if let Some(ip) = client_ip_from_headers(req.headers()) {
            return Some(ip);
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded
            .split(',')
            .next()
            .and_then(|first| first.trim().parse().ok())
        {
            return Some(ip);
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_api_key_x_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "test-key".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("test-key".to_string()));
    }

    #[test]
    fn test_extract_api_key_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test-token".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("test-token".to_string()));
    }

    #[test]
    fn test_extract_api_key_prefers_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "x-key".parse().unwrap());
        headers.insert("authorization", "Bearer bearer-key".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("x-key".to_string()));
    }

    #[test]
    fn test_extract_api_key_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_api_key_blank_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "   ".parse().unwrap());
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_api_key_invalid_bearer_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());
        assert_eq!(extract_api_key(&headers), None);
    }

    fn with_peer(builder: axum::http::request::Builder, peer: &str) -> Request {
        let mut req = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[test]
    fn test_client_ip_from_forwarded_for_behind_proxy() {
        let req = with_peer(
            Request::builder().header("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            "10.0.0.1:8080",
        );
        assert_eq!(extract_client_ip(&req, true), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_from_real_ip_behind_proxy() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&req, true), Some("198.51.100.4".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_headers_ignored_without_proxy() {
        let req = with_peer(
            Request::builder()
                .header("x-forwarded-for", "203.0.113.7")
                .header("x-real-ip", "198.51.100.4"),
            "192.0.2.10:4242",
        );
        assert_eq!(extract_client_ip(&req, false), Some("192.0.2.10".parse().unwrap()));

        let bare = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&bare, false), None);
    }

    #[test]
    fn test_proxy_without_headers_uses_peer() {
        let req = with_peer(Request::builder(), "192.0.2.10:4242");
        assert_eq!(extract_client_ip(&req, true), Some("192.0.2.10".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_unknown() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&req, false), None);
    }
}
