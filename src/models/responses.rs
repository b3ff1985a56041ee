use serde::Serialize;

use crate::synthesis::VoiceInfo;

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: String,
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_response_serialization() {
        let response = ApiKeyResponse {
            api_key: "abc123".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"api_key":"abc123"}"#);
    }

    #[test]
    fn test_voices_response_serialization() {
        let response = VoicesResponse {
            voices: vec![VoiceInfo {
                code: "en-us".to_string(),
                name: "English (America)".to_string(),
                gender: "male".to_string(),
            }],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["voices"][0]["code"], "en-us");
        assert_eq!(json["voices"][0]["name"], "English (America)");
        assert_eq!(json["voices"][0]["gender"], "male");
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
    }

    #[test]
    fn test_cleanup_response_serialization() {
        let response = CleanupResponse {
            status: "success".to_string(),
            removed: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"success","removed":3}"#);
    }
}
