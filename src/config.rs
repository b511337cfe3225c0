//! Configuration for the Key Protect client and CLI

use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{KpError, Result};

fn default_region() -> String {
    "us-south".to_string()
}

fn default_iam_endpoint() -> String {
    "https://iam.ng.bluemix.net".to_string()
}

fn default_accounts_endpoint() -> String {
    "https://api.ng.bluemix.net".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_verify_tls() -> bool {
    true
}

/// Client configuration
///
/// `endpoint` overrides the region-derived key service URL when set;
/// `trace_requests` gates the curl-style request rendering at trace level
/// and is off by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_iam_endpoint")]
    pub iam_endpoint: String,
    #[serde(default = "default_accounts_endpoint")]
    pub accounts_endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default)]
    pub trace_requests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            iam_endpoint: default_iam_endpoint(),
            accounts_endpoint: default_accounts_endpoint(),
            timeout: default_timeout(),
            verify_tls: default_verify_tls(),
            trace_requests: false,
        }
    }
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keyprotect")
        .join("config.json")
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::from_file_and_env::<&str>(None)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Load configuration: defaults, then an optional JSON file, then
    /// `KEYPROTECT_*` environment variables
    pub fn from_file_and_env<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .set_default("region", default_region())?
            .set_default("iam_endpoint", default_iam_endpoint())?
            .set_default("accounts_endpoint", default_accounts_endpoint())?
            .set_default("timeout", default_timeout())?
            .set_default("verify_tls", default_verify_tls())?
            .set_default("trace_requests", false)?;

        if let Some(config_path) = config_file {
            if config_path.as_ref().exists() {
                builder = builder.add_source(File::from(config_path.as_ref()));
            }
        }
        builder = builder.add_source(Environment::with_prefix("KEYPROTECT").try_parsing(true));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() && self.endpoint.is_none() {
            return Err(KpError::config(
                "a region or an explicit endpoint must be set",
            ));
        }

        let mut urls = vec![&self.iam_endpoint, &self.accounts_endpoint];
        if let Some(endpoint) = &self.endpoint {
            urls.push(endpoint);
        }

        for url in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(KpError::invalid_endpoint(format!(
                    "endpoint must be an http(s) URL: {}",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Base URL of the key service for the configured region
    pub fn keys_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://keyprotect.{}.bluemix.net", self.region),
        }
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    region: Option<String>,
    endpoint: Option<String>,
    iam_endpoint: Option<String>,
    accounts_endpoint: Option<String>,
    timeout: Option<u64>,
    verify_tls: Option<bool>,
    trace_requests: Option<bool>,
    config_file: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn iam_endpoint<S: Into<String>>(mut self, iam_endpoint: S) -> Self {
        self.iam_endpoint = Some(iam_endpoint.into());
        self
    }

    pub fn accounts_endpoint<S: Into<String>>(mut self, accounts_endpoint: S) -> Self {
        self.accounts_endpoint = Some(accounts_endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = Some(verify_tls);
        self
    }

    pub fn trace_requests(mut self, trace_requests: bool) -> Self {
        self.trace_requests = Some(trace_requests);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut config = Config::from_file_and_env(self.config_file.as_deref())?;

        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = Some(endpoint);
        }
        if let Some(iam_endpoint) = self.iam_endpoint {
            config.iam_endpoint = iam_endpoint;
        }
        if let Some(accounts_endpoint) = self.accounts_endpoint {
            config.accounts_endpoint = accounts_endpoint;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(verify_tls) = self.verify_tls {
            config.verify_tls = verify_tls;
        }
        if let Some(trace_requests) = self.trace_requests {
            config.trace_requests = trace_requests;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region, "us-south");
        assert_eq!(config.timeout, 30);
        assert!(config.verify_tls);
        assert!(!config.trace_requests);
    }

    #[test]
    fn test_keys_url_from_region() {
        let config = Config {
            region: "us-east".to_string(),
            ..Config::default()
        };
        assert_eq!(config.keys_url(), "https://keyprotect.us-east.bluemix.net");
    }

    #[test]
    fn test_keys_url_endpoint_override() {
        let config = Config {
            endpoint: Some("https://kp.test.local:8443/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.keys_url(), "https://kp.test.local:8443");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = Config {
            endpoint: Some("keyprotect.example.com".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"region": "eu-gb", "timeout": 5}"#).unwrap();

        let config = Config::builder()
            .config_file(&path)
            .trace_requests(true)
            .build()
            .unwrap();

        assert_eq!(config.region, "eu-gb");
        assert_eq!(config.timeout, 5);
        assert!(config.trace_requests);
        // untouched fields keep their defaults
        assert_eq!(config.iam_endpoint, "https://iam.ng.bluemix.net");
    }
}
