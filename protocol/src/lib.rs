//! Shared wire types for the Key Protect and IAM APIs
//!
//! This crate contains the serde data structures exchanged with the
//! key management service, organized by layer:
//! - `api`: request/response DTOs for specific endpoints
//! - `common`: shared domain structures referenced across endpoints

pub mod api;
pub mod common;
