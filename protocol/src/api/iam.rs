//! IAM token endpoint DTOs

use serde::{Deserialize, Serialize};

/// Successful response from POST /oidc/token
///
/// Only `access_token` is guaranteed; the remaining fields depend on the
/// grant type and are retained when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Absolute expiry as a Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_minimal() {
        let resp: TokenResponse =
            serde_json::from_value(json!({"access_token": "tok"})).unwrap();
        assert_eq!(resp.access_token, "tok");
        assert!(resp.expires_in.is_none());
    }

    #[test]
    fn test_token_response_full() {
        let resp: TokenResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "refresh_token": "rtok",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1523138580
        }))
        .unwrap();
        assert_eq!(resp.refresh_token.as_deref(), Some("rtok"));
        assert_eq!(resp.expires_in, Some(3600));
    }
}
