use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod models;
mod services;

use errors::{CleanupError, CleanupResult};
use services::{
    cleanup::{CleanupService, CleanupSummary},
    s3_client::S3StorageClient,
};

const SUCCESS_MESSAGE: &str = "S3 Deploy Cleanup Succeeded.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config ---
    let cfg = match config::CleanupConfig::from_env_and_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("Starting s3-deploy-cleanup with config: {:?}", cfg);

    match execute(&cfg).await {
        Ok(summary) => {
            tracing::info!(
                bucket = %cfg.bucket,
                deleted = summary.deleted_prefixes.len(),
                retained = summary.retained(),
                "Cleanup finished"
            );
            println!("{SUCCESS_MESSAGE}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Build the storage client and run one cleanup pass.
async fn execute(cfg: &config::CleanupConfig) -> CleanupResult<CleanupSummary> {
    let client = S3StorageClient::new(&cfg.storage).await?;
    CleanupService::new(client).run(&cfg.bucket, cfg.policy).await
}

fn report_failure(err: &CleanupError) {
    for line in err.report_lines() {
        eprintln!("{line}");
    }
}
