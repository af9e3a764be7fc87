//! Lakestack CLI entrypoint.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use lakestack::api::{ApiConfig, WorkspaceClient};
use lakestack::cli::{Cli, Commands, OutputFormatter};
use lakestack::config::{ConfigParser, ConfigValidator, StackConfig};
use lakestack::deploy::DeployOptions;
use lakestack::error::Result;
use lakestack::reconciler::Reconciler;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Deploy { config, overwrite } => {
            cmd_deploy(&config, overwrite, &formatter).await
        }
        Commands::Download { config, overwrite } => cmd_download(&config, overwrite).await,
        Commands::Validate { config } => cmd_validate(&config),
    }
}

/// Deploy a stack.
async fn cmd_deploy(
    config_path: &PathBuf,
    overwrite: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let reconciler = create_reconciler()?;

    let options = DeployOptions { overwrite };
    let status = reconciler.deploy(&config, config_path, &options).await?;

    eprintln!("{}", formatter.format_status(&status));
    Ok(())
}

/// Download workspace objects back to their local sources.
async fn cmd_download(config_path: &PathBuf, overwrite: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let reconciler = create_reconciler()?;

    let options = DeployOptions { overwrite };
    reconciler.download(&config, config_path, &options).await?;

    eprintln!("Download complete.");
    Ok(())
}

/// Validate a stack configuration.
fn cmd_validate(config_path: &PathBuf) -> Result<()> {
    let config = load_config(config_path)?;

    eprintln!("Configuration is valid!");
    eprintln!("\nStack summary:");
    eprintln!("  Name: {}", config.name);
    eprintln!("  Resources: {}", config.resources.len());
    for resource in &config.resources {
        eprintln!("    - {} ({})", resource.id, resource.kind);
    }

    Ok(())
}

/// Loads the .env file next to the configuration, then parses and
/// validates the configuration.
fn load_config(config_path: &Path) -> Result<StackConfig> {
    load_dotenv(config_path);

    let config = ConfigParser::new().load_file(config_path)?;
    ConfigValidator::new().validate(&config)?;

    Ok(config)
}

/// Loads environment variables from a .env file in the config directory.
fn load_dotenv(config_path: &Path) {
    let env_path = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(".env");

    if env_path.exists() {
        info!("Loading environment from: {}", env_path.display());
        if let Err(e) = dotenvy::from_path(&env_path) {
            debug!("Failed to load .env file: {e}");
        }
    } else {
        debug!(".env file not found at: {}", env_path.display());
    }
}

/// Creates a reconciler over one workspace API client.
fn create_reconciler() -> Result<Reconciler> {
    let api_config = ApiConfig::from_env()?;
    let client = Arc::new(WorkspaceClient::new(api_config)?);

    Ok(Reconciler::new(client.clone(), client.clone(), client))
}
