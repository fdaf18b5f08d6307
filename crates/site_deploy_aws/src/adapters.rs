//! Collaborator ports and their AWS SDK implementations.

pub mod cdn;
pub mod cloudformation;
pub mod cloudfront;
pub mod object_store;
pub mod s3;
pub mod session;
pub mod stack_outputs;
