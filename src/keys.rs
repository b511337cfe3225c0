//! Key management operations
//!
//! CRUD on key resources plus the wrap/unwrap key actions. All
//! cryptography happens on the service side; this client only
//! base64-encodes material for transport.

use base64::{engine::general_purpose, Engine};
use reqwest::Method;
use validator::Validate;

use keyprotect_protocol::api::{
    CreateKey, CreateKeysRequest, KeysResponse, UnwrapRequest, UnwrapResponse, WrapRequest,
    WrapResponse,
};
use keyprotect_protocol::common::Key;

use crate::client::{ApiRequest, HttpTransport, Transport};
use crate::config::Config;
use crate::error::{KpError, Result};

/// Key material supplied at creation time
///
/// `Raw` bytes are base64-encoded before transport; `Encoded` strings are
/// attached verbatim.
#[derive(Debug, Clone)]
pub enum KeyPayload {
    Raw(Vec<u8>),
    Encoded(String),
}

impl KeyPayload {
    fn into_encoded(self) -> String {
        match self {
            KeyPayload::Raw(bytes) => general_purpose::STANDARD.encode(bytes),
            KeyPayload::Encoded(encoded) => encoded,
        }
    }
}

/// Client for the key management API
///
/// Every request carries the bearer token and the `Bluemix-Instance`
/// header identifying the service instance. The client holds no mutable
/// state and is safe to share across tasks.
#[derive(Debug)]
pub struct KeyClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    token: String,
    instance_id: String,
}

impl KeyClient<HttpTransport> {
    pub fn new(
        config: &Config,
        token: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(config, transport, token, instance_id))
    }
}

impl<T: Transport> KeyClient<T> {
    pub fn with_transport(
        config: &Config,
        transport: T,
        token: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: config.keys_url(),
            token: token.into(),
            instance_id: instance_id.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, format!("{}{}", self.base_url, path))
            .bearer(&self.token)
            .header("Bluemix-Instance", self.instance_id.as_str())
    }

    /// List the keys in the instance
    ///
    /// An account with no keys yields an empty list, not an error.
    pub async fn list(&self) -> Result<Vec<Key>> {
        let response = self
            .transport
            .execute(self.request(Method::GET, "/api/v2/keys"))
            .await?
            .ensure_success()?;

        let keys: KeysResponse = response.json()?;
        Ok(keys.resources)
    }

    /// Fetch a single key by id
    pub async fn get(&self, id: &str) -> Result<Key> {
        let path = format!("/api/v2/keys/{}", id);
        let response = self
            .transport
            .execute(self.request(Method::GET, &path))
            .await?
            .ensure_success()?;

        let keys: KeysResponse = response.json()?;
        keys.resources
            .into_iter()
            .next()
            .ok_or_else(|| KpError::invalid_response("key response contained no resources"))
    }

    /// Create a key
    ///
    /// `root` creates a non-exportable key; only root keys support
    /// wrap/unwrap.
    pub async fn create(&self, name: &str, root: bool) -> Result<Key> {
        self.create_key(CreateKey::new(name, root)).await
    }

    /// Create a key from supplied material
    pub async fn create_with_payload(
        &self,
        name: &str,
        root: bool,
        payload: KeyPayload,
    ) -> Result<Key> {
        let mut key = CreateKey::new(name, root);
        key.payload = Some(payload.into_encoded());
        self.create_key(key).await
    }

    async fn create_key(&self, key: CreateKey) -> Result<Key> {
        let envelope = CreateKeysRequest::single(key);
        envelope.validate()?;

        let request = self.request(Method::POST, "/api/v2/keys").json(&envelope)?;
        let response = self.transport.execute(request).await?.ensure_success()?;

        let keys: KeysResponse = response.json()?;
        keys.resources
            .into_iter()
            .next()
            .ok_or_else(|| KpError::invalid_response("create response contained no resources"))
    }

    /// Delete a key
    ///
    /// The service soft-deletes: the key transitions to the destroyed
    /// state rather than disappearing.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("/api/v2/keys/{}", id);
        self.transport
            .execute(self.request(Method::DELETE, &path))
            .await?
            .ensure_success()?;
        Ok(())
    }

    /// Wrap plaintext under a root key
    ///
    /// The `aad` list, when given, must be reproduced exactly (same
    /// entries, same order) on the matching unwrap or the service rejects
    /// it.
    pub async fn wrap(
        &self,
        id: &str,
        plaintext: &[u8],
        aad: Option<&[String]>,
    ) -> Result<WrapResponse> {
        let body = WrapRequest {
            plaintext: general_purpose::STANDARD.encode(plaintext),
            aad: aad.map(|entries| entries.to_vec()),
        };

        let path = format!("/api/v2/keys/{}", id);
        let request = self
            .request(Method::POST, &path)
            .query("action", "wrap")
            .json(&body)?;

        let response = self.transport.execute(request).await?.ensure_success()?;
        response.json()
    }

    /// Unwrap a ciphertext back to the original plaintext bytes
    pub async fn unwrap(
        &self,
        id: &str,
        ciphertext: &str,
        aad: Option<&[String]>,
    ) -> Result<Vec<u8>> {
        let body = UnwrapRequest {
            ciphertext: ciphertext.to_string(),
            aad: aad.map(|entries| entries.to_vec()),
        };

        let path = format!("/api/v2/keys/{}", id);
        let request = self
            .request(Method::POST, &path)
            .query("action", "unwrap")
            .json(&body)?;

        let response = self.transport.execute(request).await?.ensure_success()?;
        let unwrapped: UnwrapResponse = response.json()?;

        general_purpose::STANDARD
            .decode(unwrapped.plaintext.as_bytes())
            .map_err(|e| KpError::invalid_response(format!("invalid base64 plaintext: {}", e)))
    }
}
