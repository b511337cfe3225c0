//! Authentication against the IAM token service
//!
//! Exchanges a long-lived credential for a short-lived bearer token and
//! resolves organization/space identifiers tied to the account.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use tracing::debug;

use keyprotect_protocol::api::TokenResponse;
use keyprotect_protocol::common::{Org, OrgEntity, ResourceList, Space, SpaceEntity};

use crate::client::{ApiRequest, HttpTransport, Transport};
use crate::config::Config;
use crate::error::{KpError, Result};

/// Fixed Basic auth header for the token endpoint
///
/// The "bx:bx" client id/secret pair is a public, documented identifier,
/// not a secret.
const IAM_BASIC_AUTH: &str = "Basic Yng6Yng=";

const GRANT_TYPE_APIKEY: &str = "urn:ibm:params:oauth:grant-type:apikey";
const GRANT_TYPE_PASSWORD: &str = "password";

/// A long-lived credential exchanged for bearer tokens
///
/// Immutable once supplied. The `Debug` impl never prints secret material.
#[derive(Clone)]
pub enum Credential {
    ApiKey(String),
    Password { username: String, password: String },
}

impl Credential {
    /// Pick up an API key from the environment
    ///
    /// Scans `IBMCLOUD_API_KEY` then `BLUEMIX_API_KEY`; the first
    /// non-empty value wins.
    pub fn from_env() -> Option<Self> {
        for var in ["IBMCLOUD_API_KEY", "BLUEMIX_API_KEY"] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Some(Credential::ApiKey(value));
                }
            }
        }
        None
    }

    fn grant_fields(&self) -> Vec<(String, String)> {
        match self {
            Credential::ApiKey(apikey) => vec![
                ("grant_type".to_string(), GRANT_TYPE_APIKEY.to_string()),
                ("apikey".to_string(), apikey.clone()),
            ],
            Credential::Password { username, password } => vec![
                ("grant_type".to_string(), GRANT_TYPE_PASSWORD.to_string()),
                ("username".to_string(), username.clone()),
                ("password".to_string(), password.clone()),
            ],
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Credential::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Token manager
///
/// Holds an optional credential and the most recent token response. No
/// background refresh: a token is fetched on demand and replaced when it
/// is within a minute of its advertised expiry.
#[derive(Debug)]
pub struct TokenManager<T: Transport = HttpTransport> {
    transport: T,
    config: Config,
    credential: Option<Credential>,
    token: Option<TokenResponse>,
    token_expires_at: Option<DateTime<Utc>>,
}

impl TokenManager<HttpTransport> {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_api_key(config: Config, api_key: impl Into<String>) -> Result<Self> {
        let mut manager = Self::new(config)?;
        manager.set_credential(Credential::ApiKey(api_key.into()));
        Ok(manager)
    }

    pub fn with_password(
        config: Config,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let mut manager = Self::new(config)?;
        manager.set_credential(Credential::Password {
            username: username.into(),
            password: password.into(),
        });
        Ok(manager)
    }

    /// Build a manager with whatever credential the environment provides
    ///
    /// The credential may be absent; `authenticate` reports that as a
    /// missing-credentials error without touching the network.
    pub fn from_env(config: Config) -> Result<Self> {
        let mut manager = Self::new(config)?;
        manager.credential = Credential::from_env();
        Ok(manager)
    }
}

impl<T: Transport> TokenManager<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            transport,
            config,
            credential: None,
            token: None,
            token_expires_at: None,
        }
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
        self.token = None;
        self.token_expires_at = None;
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Exchange the held credential for a fresh bearer token
    ///
    /// Fails before any request is made when no credential is held. A
    /// non-200 from the token endpoint surfaces with its raw status and
    /// body attached.
    pub async fn authenticate(&mut self) -> Result<String> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(KpError::missing_credentials)?;

        let mut fields = vec![
            ("response_type".to_string(), "cloud_iam".to_string()),
            ("uaa_client_id".to_string(), "cf".to_string()),
            ("uaa_client_secret".to_string(), String::new()),
        ];
        fields.extend(credential.grant_fields());

        let url = format!("{}/oidc/token", self.config.iam_endpoint);
        let request = ApiRequest::new(Method::POST, url)
            .header("Authorization", IAM_BASIC_AUTH)
            .header("Accept", "application/json")
            .form(fields);

        let response = self.transport.execute(request).await?;
        if response.status != 200 {
            return Err(KpError::auth_rejected(response.status, response.text()));
        }

        let token: TokenResponse = response.json()?;
        self.token_expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        let access_token = token.access_token.clone();
        self.token = Some(token);

        debug!("authenticated against {}", self.config.iam_endpoint);
        Ok(access_token)
    }

    /// Current access token, re-authenticating when absent or near expiry
    pub async fn token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            match self.token_expires_at {
                Some(expires_at) if expires_at > Utc::now() + Duration::seconds(60) => {
                    return Ok(token.access_token.clone());
                }
                // no advertised lifetime, keep using the token we have
                None => return Ok(token.access_token.clone()),
                _ => {}
            }
        }
        self.authenticate().await
    }

    /// Most recent token response, when one is held
    pub fn token_response(&self) -> Option<&TokenResponse> {
        self.token.as_ref()
    }

    /// List the organizations visible to the account
    pub async fn list_organizations(&mut self) -> Result<Vec<Org>> {
        let token = self.token().await?;
        let url = format!("{}/v2/organizations", self.config.accounts_endpoint);
        let request = ApiRequest::new(Method::GET, url)
            .bearer(&token)
            .header("Accept", "application/json;charset=utf-8");

        let response = self.transport.execute(request).await?.ensure_success()?;
        let list: ResourceList<OrgEntity> = response.json()?;
        Ok(list.resources)
    }

    /// List the spaces under an organization's `spaces_url`
    pub async fn list_spaces(&mut self, spaces_url: &str) -> Result<Vec<Space>> {
        let token = self.token().await?;
        let url = format!("{}{}", self.config.accounts_endpoint, spaces_url);
        let request = ApiRequest::new(Method::GET, url)
            .bearer(&token)
            .header("Accept", "application/json;charset=utf-8");

        let response = self.transport.execute(request).await?.ensure_success()?;
        let list: ResourceList<SpaceEntity> = response.json()?;
        Ok(list.resources)
    }

    /// Find an organization and one of its spaces by name
    ///
    /// Both scans are linear and the first name match wins. A miss on
    /// either lookup is an error naming what was searched for.
    pub async fn find_org_and_space(
        &mut self,
        org_name: &str,
        space_name: &str,
    ) -> Result<(Org, Space)> {
        let orgs = self.list_organizations().await?;
        let org = orgs
            .into_iter()
            .find(|org| org.entity.name == org_name)
            .ok_or_else(|| KpError::not_found(format!("organization '{}'", org_name)))?;

        let spaces = self.list_spaces(&org.entity.spaces_url).await?;
        let space = spaces
            .into_iter()
            .find(|space| space.entity.name == space_name)
            .ok_or_else(|| {
                KpError::not_found(format!(
                    "space '{}' in organization '{}'",
                    space_name, org_name
                ))
            })?;

        Ok((org, space))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RequestBody;
    use crate::error::ErrorCode;
    use crate::tests::mocks::MockTransport;
    use serde_json::json;

    fn manager(transport: MockTransport) -> TokenManager<MockTransport> {
        TokenManager::with_transport(Config::default(), transport)
    }

    fn form_fields(request: &ApiRequest) -> Vec<(String, String)> {
        match &request.body {
            RequestBody::Form(fields) => fields.clone(),
            other => panic!("expected form body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authenticate_without_credential_makes_no_request() {
        let transport = MockTransport::new();
        let mut manager = manager(transport.clone());

        let err = manager.authenticate().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingCredentials);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_api_key_grant() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"access_token": "tok-1", "expires_in": 3600}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("my-api-key".to_string()));

        let token = manager.authenticate().await.unwrap();
        assert_eq!(token, "tok-1");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.url.ends_with("/oidc/token"));
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), IAM_BASIC_AUTH.to_string())));
        assert!(request
            .headers
            .contains(&("Accept".to_string(), "application/json".to_string())));

        let fields = form_fields(request);
        assert!(fields.contains(&("grant_type".to_string(), GRANT_TYPE_APIKEY.to_string())));
        assert!(fields.contains(&("apikey".to_string(), "my-api-key".to_string())));
        assert!(fields.contains(&("response_type".to_string(), "cloud_iam".to_string())));
    }

    #[tokio::test]
    async fn test_authenticate_password_grant() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"access_token": "tok-2"}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::Password {
            username: "user".to_string(),
            password: "pass".to_string(),
        });

        manager.authenticate().await.unwrap();

        let fields = form_fields(&transport.requests()[0]);
        assert!(fields.contains(&("grant_type".to_string(), GRANT_TYPE_PASSWORD.to_string())));
        assert!(fields.contains(&("username".to_string(), "user".to_string())));
        assert!(fields.contains(&("password".to_string(), "pass".to_string())));
    }

    #[tokio::test]
    async fn test_authenticate_rejection_carries_status_and_body() {
        let transport = MockTransport::new();
        transport.push_json(400, json!({"errorMessage": "bad api key"}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("bogus".to_string()));

        let err = manager.authenticate().await.unwrap_err();
        match err {
            KpError::Auth { status, body, .. } => {
                assert_eq!(status, Some(400));
                assert!(body.unwrap().contains("bad api key"));
            }
            other => panic!("expected Auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_is_cached_until_expiry() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"access_token": "tok-3", "expires_in": 3600}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("key".to_string()));

        assert_eq!(manager.token().await.unwrap(), "tok-3");
        assert_eq!(manager.token().await.unwrap(), "tok-3");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_triggers_reauthentication() {
        let transport = MockTransport::new();
        // lifetime shorter than the 60s skew margin, so the next call refreshes
        transport.push_json(200, json!({"access_token": "tok-old", "expires_in": 10}));
        transport.push_json(200, json!({"access_token": "tok-new", "expires_in": 3600}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("key".to_string()));

        assert_eq!(manager.authenticate().await.unwrap(), "tok-old");
        assert_eq!(manager.token().await.unwrap(), "tok-new");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_find_org_and_space() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"access_token": "tok", "expires_in": 3600}));
        transport.push_json(
            200,
            json!({"resources": [
                {"entity": {"name": "other", "spaces_url": "/v2/organizations/1/spaces"}},
                {"entity": {"name": "myorg", "spaces_url": "/v2/organizations/2/spaces"}}
            ]}),
        );
        transport.push_json(
            200,
            json!({"resources": [{"entity": {"name": "dev"}}]}),
        );

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("key".to_string()));

        let (org, space) = manager.find_org_and_space("myorg", "dev").await.unwrap();
        assert_eq!(org.entity.name, "myorg");
        assert_eq!(space.entity.name, "dev");

        // the spaces request was driven by the matched org's spaces_url
        let spaces_request = &transport.requests()[2];
        assert!(spaces_request.url.ends_with("/v2/organizations/2/spaces"));
    }

    #[tokio::test]
    async fn test_find_org_miss_is_not_found() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"access_token": "tok", "expires_in": 3600}));
        transport.push_json(200, json!({"resources": []}));

        let mut manager = manager(transport.clone());
        manager.set_credential(Credential::ApiKey("key".to_string()));

        let err = manager.find_org_and_space("ghost", "dev").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let api_key = Credential::ApiKey("super-secret".to_string());
        assert!(!format!("{:?}", api_key).contains("super-secret"));

        let password = Credential::Password {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", password);
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
