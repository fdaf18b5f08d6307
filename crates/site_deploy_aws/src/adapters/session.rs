use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads shared SDK configuration for one command invocation.
///
/// Explicit profile and region take precedence over the default provider
/// chains (environment, shared config files, instance metadata).
pub async fn load_sdk_config(profile: Option<&str>, region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
