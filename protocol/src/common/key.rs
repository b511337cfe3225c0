//! Key resource types
//!
//! This module contains the key resource as returned by the key management
//! service, including the lifecycle state enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Key State
// ============================================================================

/// Lifecycle state of a key
///
/// States follow the NIST SP 800-57 model and are carried on the wire as
/// integer codes: 0 (pre-activation), 1 (active), 3 (deactivated),
/// 5 (destroyed). Transitions are driven entirely by the service; clients
/// only observe the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum KeyState {
    Preactivation,
    Active,
    Deactivated,
    Destroyed,
}

impl From<KeyState> for u8 {
    fn from(state: KeyState) -> u8 {
        match state {
            KeyState::Preactivation => 0,
            KeyState::Active => 1,
            KeyState::Deactivated => 3,
            KeyState::Destroyed => 5,
        }
    }
}

impl TryFrom<u8> for KeyState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(KeyState::Preactivation),
            1 => Ok(KeyState::Active),
            3 => Ok(KeyState::Deactivated),
            5 => Ok(KeyState::Destroyed),
            other => Err(format!("unknown key state code: {}", other)),
        }
    }
}

// ============================================================================
// Key Resource
// ============================================================================

/// A key resource
///
/// `id` and the metadata fields are assigned by the service and absent on
/// requests. `payload` carries base64-encoded key material and is only
/// present for extractable keys created from imported material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    pub name: String,
    pub extractable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<KeyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_date: Option<DateTime<Utc>>,
}

impl Key {
    /// Whether this is a root (non-exportable) key
    ///
    /// Only root keys support wrap/unwrap.
    pub fn is_root(&self) -> bool {
        !self.extractable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_state_wire_codes() {
        for (state, code) in [
            (KeyState::Preactivation, 0u8),
            (KeyState::Active, 1),
            (KeyState::Deactivated, 3),
            (KeyState::Destroyed, 5),
        ] {
            assert_eq!(u8::from(state), code);
            assert_eq!(KeyState::try_from(code).unwrap(), state);
        }
    }

    #[test]
    fn test_key_state_unknown_code_rejected() {
        assert!(KeyState::try_from(2).is_err());
        assert!(serde_json::from_value::<KeyState>(json!(7)).is_err());
    }

    #[test]
    fn test_key_deserialize_from_service_response() {
        let key: Key = serde_json::from_value(json!({
            "id": "4a33ad42-6cf7-4f9c-a444-61c2b7a3b241",
            "type": "application/vnd.ibm.kms.key+json",
            "name": "MyRootKey",
            "extractable": false,
            "state": 1,
            "crn": "crn:v1:bluemix:public:kms:us-south:a/1:2:key:3",
            "createdBy": "IBMid-0000",
            "creationDate": "2018-04-07T22:14:32Z"
        }))
        .unwrap();

        assert_eq!(key.name, "MyRootKey");
        assert_eq!(key.state, Some(KeyState::Active));
        assert!(key.is_root());
    }
}
