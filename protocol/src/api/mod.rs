//! API DTOs module
//!
//! This module contains all API data transfer objects organized by domain:
//! - `iam`: token endpoint responses
//! - `keys`: key collection, create, and wrap/unwrap bodies

pub mod iam;
pub mod keys;

pub use iam::*;
pub use keys::*;
