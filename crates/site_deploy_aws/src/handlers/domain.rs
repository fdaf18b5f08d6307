use site_deploy_core::error::DeployError;
use site_deploy_core::invalidation::{find_distribution_domain, DISTRIBUTION_DOMAIN_OUTPUT_KEY};
use tracing::info;

use crate::adapters::stack_outputs::StackOutputs;

const COMPONENT: &str = "domain_resolver";

/// Looks up the distribution domain published as a stack output.
#[derive(Clone, Copy)]
pub struct DomainResolver<'a> {
    stacks: &'a dyn StackOutputs,
}

impl<'a> DomainResolver<'a> {
    pub fn new(stacks: &'a dyn StackOutputs) -> Self {
        Self { stacks }
    }

    /// `Ok(None)` means the stack exists but has no distribution domain output;
    /// a failed stack query is a [`DeployError::DomainLookup`].
    pub async fn resolve_domain(&self, stack_name: &str) -> Result<Option<String>, DeployError> {
        let outputs = self
            .stacks
            .describe_stack_outputs(stack_name)
            .await
            .map_err(|cause| DeployError::DomainLookup {
                stack_name: stack_name.to_string(),
                cause,
            })?;

        let domain_name = find_distribution_domain(&outputs).map(str::to_string);
        match &domain_name {
            Some(domain_name) => info!(
                component = COMPONENT,
                stack_name,
                domain_name = %domain_name,
                "resolved distribution domain"
            ),
            None => info!(
                component = COMPONENT,
                stack_name,
                output_key = DISTRIBUTION_DOMAIN_OUTPUT_KEY,
                outputs = outputs.len(),
                "distribution domain output not found"
            ),
        }

        Ok(domain_name)
    }
}
