//! Client library for the Key Protect service
//!
//! Two components: [`TokenManager`] exchanges a long-lived credential for
//! a short-lived bearer token at the IAM token endpoint, and [`KeyClient`]
//! drives the key management REST API with that token: list, get,
//! create, delete, plus the wrap/unwrap envelope-encryption actions.
//!
//! ```no_run
//! use keyprotect::{Config, KeyClient, TokenManager};
//!
//! # async fn run() -> keyprotect::Result<()> {
//! let config = Config::builder().region("us-south").build()?;
//! let mut tokens = TokenManager::from_env(config.clone())?;
//! let token = tokens.token().await?;
//!
//! let client = KeyClient::new(&config, token, "my-instance-id")?;
//! for key in client.list().await? {
//!     println!("{}\t{}", key.id.unwrap_or_default(), key.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod keys;

#[cfg(test)]
pub mod tests;

pub use auth::{Credential, TokenManager};
pub use client::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use config::{Config, ConfigBuilder};
pub use error::{ErrorCode, KpError, Result};
pub use keys::{KeyClient, KeyPayload};

pub use keyprotect_protocol as protocol;
