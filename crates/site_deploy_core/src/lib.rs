//! Shared static-site deploy domain primitives.
//!
//! This crate owns deterministic deploy behavior: configuration, object key and
//! content-type derivation, local tree traversal, and invalidation batches.
//! It intentionally excludes AWS SDK and async runtime concerns; those live in
//! `site_deploy_aws`.

pub mod config;
pub mod content_type;
pub mod error;
pub mod invalidation;
pub mod local_tree;
pub mod object_keys;
