use async_trait::async_trait;
use site_deploy_core::invalidation::StackOutput;

#[async_trait]
pub trait StackOutputs: Send + Sync {
    /// Fails when the stack does not exist or cannot be described.
    async fn describe_stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>, String>;
}
