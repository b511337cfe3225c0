//! Key management API DTOs
//!
//! This module contains data transfer objects for the key collection
//! endpoints, including key creation and the wrap/unwrap key actions.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::{Key, KeyState};

/// Collection type identifier carried in key collection envelopes
pub const KEY_COLLECTION_TYPE: &str = "application/vnd.ibm.kms.key+json";

// ============================================================================
// Collection Envelopes
// ============================================================================

/// Metadata block of a key collection envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    pub collection_type: String,
    pub collection_total: u32,
}

/// Response envelope for the key collection endpoints
///
/// The service omits `resources` entirely for an empty account; that case
/// deserializes as an empty list rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CollectionMetadata>,
    #[serde(default)]
    pub resources: Vec<Key>,
}

// ============================================================================
// Key Creation DTOs
// ============================================================================

/// A single key to create
///
/// `extractable` is the inverse of the root flag: root keys are
/// non-exportable. `payload` is base64 key material for imported keys.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKey {
    #[serde(rename = "type")]
    pub key_type: String,
    /// Key name, server-enforced at 1-90 characters
    #[validate(length(min = 1, max = 90))]
    pub name: String,
    pub extractable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl CreateKey {
    pub fn new(name: impl Into<String>, root: bool) -> Self {
        Self {
            key_type: KEY_COLLECTION_TYPE.to_string(),
            name: name.into(),
            extractable: !root,
            payload: None,
        }
    }
}

/// Request envelope for POST /api/v2/keys
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateKeysRequest {
    pub metadata: CollectionMetadata,
    #[validate(nested)]
    pub resources: Vec<CreateKey>,
}

impl CreateKeysRequest {
    /// Wrap a single key in the collection envelope
    pub fn single(key: CreateKey) -> Self {
        Self {
            metadata: CollectionMetadata {
                collection_type: KEY_COLLECTION_TYPE.to_string(),
                collection_total: 1,
            },
            resources: vec![key],
        }
    }
}

// ============================================================================
// Wrap / Unwrap DTOs
// ============================================================================

/// Body for POST /api/v2/keys/{id}?action=wrap
///
/// `plaintext` is base64-encoded by the client before transport. `aad`
/// entries are bound to the resulting ciphertext; the same list, in the
/// same order, must accompany the matching unwrap call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapRequest {
    pub plaintext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<Vec<String>>,
}

/// Response body of a wrap action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapResponse {
    /// Opaque ciphertext blob, returned to the service verbatim on unwrap
    pub ciphertext: String,
}

/// Body for POST /api/v2/keys/{id}?action=unwrap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnwrapRequest {
    pub ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<Vec<String>>,
}

/// Response body of an unwrap action; `plaintext` is base64-encoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnwrapResponse {
    pub plaintext: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_envelope() {
        let req = CreateKeysRequest::single(CreateKey::new("MyRootKey", true));
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["metadata"]["collectionType"], KEY_COLLECTION_TYPE);
        assert_eq!(value["metadata"]["collectionTotal"], 1);
        assert_eq!(value["resources"][0]["extractable"], false);
        assert_eq!(value["resources"][0]["name"], "MyRootKey");
        // no payload field when no material is supplied
        assert!(value["resources"][0].get("payload").is_none());
    }

    #[test]
    fn test_create_key_name_bounds() {
        assert!(CreateKey::new("k", false).validate().is_ok());
        assert!(CreateKey::new("", false).validate().is_err());
        assert!(CreateKey::new("x".repeat(91), false).validate().is_err());
    }

    #[test]
    fn test_wrap_request_omits_empty_aad() {
        let req = WrapRequest {
            plaintext: "aGVsbG8=".to_string(),
            aad: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("aad").is_none());
    }

    #[test]
    fn test_wrap_request_preserves_aad_order() {
        let req = WrapRequest {
            plaintext: "aGVsbG8=".to_string(),
            aad: Some(vec!["first".to_string(), "second".to_string()]),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["aad"], json!(["first", "second"]));
    }

    #[test]
    fn test_empty_keys_response() {
        let resp: KeysResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.resources.is_empty());
    }
}
