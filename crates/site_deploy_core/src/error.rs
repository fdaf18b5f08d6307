/// Terminal failures of the deploy commands.
///
/// Each variant names the resource it failed on; `cause` carries the
/// underlying collaborator message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error("failed to clear bucket '{bucket}': {cause}")]
    BucketClear { bucket: String, cause: String },

    #[error("failed to upload object '{key}': {cause}")]
    Upload { key: String, cause: String },

    #[error("failed to enumerate local files under '{root}': {cause}")]
    LocalTree { root: String, cause: String },

    #[error("failed to look up outputs of stack '{stack_name}': {cause}")]
    DomainLookup { stack_name: String, cause: String },

    #[error("failed to invalidate distribution cache for stack '{stack_name}': {cause}")]
    Invalidation { stack_name: String, cause: String },
}

impl DeployError {
    /// Short machine-friendly name of the failure class, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BucketClear { .. } => "bucket_clear",
            Self::Upload { .. } => "upload",
            Self::LocalTree { .. } => "local_tree",
            Self::DomainLookup { .. } => "domain_lookup",
            Self::Invalidation { .. } => "invalidation",
        }
    }
}
