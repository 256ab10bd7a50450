use crate::{models::policy::RetentionPolicy, services::s3_client::StorageSettings};
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Centralized run configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub bucket: String,
    pub policy: RetentionPolicy,
    pub storage: StorageSettings,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Delete old deployment folders from an S3 bucket, keeping the newest COUNT"
)]
pub struct Args {
    /// Bucket holding one folder per deployment
    pub bucket_name: String,

    /// Number of most recent deployments to always keep
    pub count: usize,

    /// Maximum days to retain deployments. (Must also meet minimum COUNT requirements.)
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Endpoint URL (overrides S3DC_ENDPOINT)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// AWS credentials profile to use for this session
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Region for S3 bucket connection (overrides S3DC_REGION) [default: us-east-1]
    #[arg(short, long)]
    pub region: Option<String>,

    /// Connect/read timeout in seconds for the S3 connection (overrides S3DC_TIMEOUT) [default: 10]
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl CleanupConfig {
    /// Parse environment variables + CLI args into CleanupConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed `args` with variables looked up through `var`.
    pub fn resolve<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_endpoint = optional_var(&var, "S3DC_ENDPOINT")?;
        let env_region = optional_var(&var, "S3DC_REGION")?;
        let env_timeout = parsed_var::<u64, _>(&var, "S3DC_TIMEOUT")?;
        let max_attempts =
            parsed_var::<u32, _>(&var, "S3DC_MAX_ATTEMPTS")?.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            anyhow::bail!("S3DC_MAX_ATTEMPTS must be at least 1");
        }

        // --- Merge ---
        let timeout_secs = args
            .timeout
            .or(env_timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            bucket: args.bucket_name,
            policy: RetentionPolicy::new(args.count, args.days.unwrap_or(0)),
            storage: StorageSettings {
                region: args
                    .region
                    .or(env_region)
                    .unwrap_or_else(|| DEFAULT_REGION.into()),
                endpoint: args.endpoint.or(env_endpoint),
                profile: args.profile,
                timeout: Duration::from_secs(timeout_secs),
                max_attempts,
            },
        })
    }
}

fn optional_var<F>(var: &F, name: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {name}")),
    }
}

fn parsed_var<T, F>(var: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    optional_var(var, name)?
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("parsing {name} value `{value}`"))
        })
        .transpose()
}
