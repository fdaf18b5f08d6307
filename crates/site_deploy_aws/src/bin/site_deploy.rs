use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use site_deploy_aws::adapters::cloudformation::CloudFormationStackOutputs;
use site_deploy_aws::adapters::cloudfront::CloudFrontCdn;
use site_deploy_aws::adapters::s3::S3ObjectStore;
use site_deploy_aws::adapters::session::load_sdk_config;
use site_deploy_aws::handlers::commands::{
    domain_info, invalidate_cache, render_domain_info, render_invalidation_outcome,
    render_sync_report, sync_to_s3,
};
use site_deploy_core::config::{normalize_config, DeployConfig, DeployConfigFile};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "site_deploy",
    version,
    about = "Deploy a static site to S3 and refresh its CloudFront cache",
    long_about = "Synchronizes a local build directory into an S3 bucket, resolves the\n\
                  CloudFront domain published by the service's CloudFormation stack,\n\
                  and invalidates that distribution's cache."
)]
struct Cli {
    /// JSON config file (bucketName, localPath, profile, region, service, stage, uploadConcurrency)
    #[arg(long, global = true, env = "SITE_DEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Target bucket name
    #[arg(long, global = true, env = "SITE_DEPLOY_BUCKET")]
    bucket: Option<String>,

    /// Local directory to upload
    #[arg(long, global = true, env = "SITE_DEPLOY_LOCAL_PATH")]
    local_path: Option<PathBuf>,

    /// AWS credential profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Service name; the stack is `<service>-<stage>`
    #[arg(long, global = true, env = "SITE_DEPLOY_SERVICE")]
    service: Option<String>,

    /// Deployment stage
    #[arg(long, global = true, env = "SITE_DEPLOY_STAGE")]
    stage: Option<String>,

    /// Number of uploads in flight at once
    #[arg(long, global = true, env = "SITE_DEPLOY_UPLOAD_CONCURRENCY")]
    upload_concurrency: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Result format written to stdout
    #[arg(value_enum, long, global = true, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Empty the bucket and upload the local directory
    SyncToS3,
    /// Print the CloudFront domain published by the stack
    DomainInfo,
    /// Invalidate every cached path of the stack's distribution
    InvalidateCache,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn overrides(&self) -> DeployConfigFile {
        DeployConfigFile {
            bucket_name: self.bucket.clone(),
            local_path: self.local_path.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            service: self.service.clone(),
            stage: self.stage.clone(),
            upload_concurrency: self.upload_concurrency,
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn init_logging(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> Result<DeployConfig> {
    let from_file = match &cli.config {
        Some(path) => DeployConfigFile::from_json_file(path)?,
        None => DeployConfigFile::default(),
    };
    Ok(normalize_config(from_file.merged_with(cli.overrides()))?)
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: String) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(value).context("failed to serialize command result")?
        ),
    }
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = resolve_config(&cli)?;
    let sdk_config = load_sdk_config(config.profile.as_deref(), config.region.as_deref()).await;

    match cli.command {
        Commands::SyncToS3 => {
            let store = S3ObjectStore::from_sdk_config(&sdk_config);
            let report = sync_to_s3(&config, &store).await?;
            emit(cli.output, &report, render_sync_report(&report))
        }
        Commands::DomainInfo => {
            let stacks = CloudFormationStackOutputs::from_sdk_config(&sdk_config);
            let info = domain_info(&config, &stacks).await?;
            emit(cli.output, &info, render_domain_info(&info))
        }
        Commands::InvalidateCache => {
            let stacks = CloudFormationStackOutputs::from_sdk_config(&sdk_config);
            let cdn = CloudFrontCdn::from_sdk_config(&sdk_config);
            let outcome = invalidate_cache(&config, &stacks, &cdn).await?;
            let text = render_invalidation_outcome(&config.stack_name()?, &outcome);
            emit(cli.output, &outcome, text)
        }
    }
}
