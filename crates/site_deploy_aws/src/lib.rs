//! AWS-oriented adapters and handlers for static site deploys.
//!
//! This crate owns runtime integration details (S3, CloudFormation and
//! CloudFront clients) and the command handlers that orchestrate them. Pure
//! deploy primitives live in `site_deploy_core`.

pub mod adapters;
pub mod handlers;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
