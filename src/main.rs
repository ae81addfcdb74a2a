use clap::Parser;
use dotenvy::dotenv;
use shop_admin::cli::{Cli, commands};
use shop_admin::config;
use shop_admin::core::AdminData;
use shop_admin::errors::Result;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible); stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal: variables can be set externally
    dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 3. Load settings and connect to the configured services
    let settings = config::load_default_settings()?;
    let backend = config::get_store_backend()?;
    let store = config::connect_store(&backend)
        .await
        .inspect_err(|e| error!("Failed to open store: {}", e))?;
    let uploader = config::build_uploader(config::get_uploader_config().as_ref())?;
    info!("Services ready.");

    // 4. Run the command
    let data = AdminData::new(store, uploader, settings.images.policy());
    commands::run(cli.command, &data, &settings).await
}
