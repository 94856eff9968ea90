//! admission-bootstrapper - ensures an admission webhook is deployed and registered.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Reads the configuration from the environment
//! - Runs the bootstrap once and exits non-zero on failure

use std::process::ExitCode;

use tracing::{error, info};

use admission_bootstrapper::{BootstrapConfig, Error, bootstrap};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting admission-bootstrapper");

    match run().await {
        Ok(()) => {
            info!("bootstrap complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, retryable = e.is_retryable(), "bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = BootstrapConfig::from_env()?;
    let report = bootstrap(&config).await?;
    info!(
        name = %config.name,
        registration = ?report.registration,
        service_created = report.service_created,
        stateful_set_created = report.stateful_set_created,
        "Admission webhook ready"
    );
    Ok(())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admission_bootstrapper=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .try_init()
}
