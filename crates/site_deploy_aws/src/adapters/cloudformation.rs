use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use site_deploy_core::invalidation::StackOutput;

use crate::adapters::stack_outputs::StackOutputs;

#[derive(Debug, Clone)]
pub struct CloudFormationStackOutputs {
    cloudformation_client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStackOutputs {
    pub fn new(cloudformation_client: aws_sdk_cloudformation::Client) -> Self {
        Self {
            cloudformation_client,
        }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(aws_sdk_cloudformation::Client::new(config))
    }
}

#[async_trait]
impl StackOutputs for CloudFormationStackOutputs {
    async fn describe_stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>, String> {
        let output = self
            .cloudformation_client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to describe cloudformation stack: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        let stack = output
            .stacks()
            .first()
            .ok_or_else(|| format!("stack '{stack_name}' was not returned by describe_stacks"))?;

        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some(StackOutput {
                    key: output.output_key()?.to_string(),
                    value: output.output_value()?.to_string(),
                })
            })
            .collect())
    }
}
