//! SmartThings CLI binary entry point.

use clap::Parser;
use smartthings::cli::commands;
use smartthings::cli::{Cli, Commands};
use smartthings::config::SmartThingsConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match SmartThingsConfig::from_env() {
        Ok(env) => {
            let config = cli.global.apply(env);
            match &cli.command {
                Commands::Login => commands::handle_login(&config).await,
                Commands::Devices(args) => commands::handle_devices(&config, args.all).await,
                Commands::Device(args) => commands::handle_device(&config, &args.id).await,
                Commands::Capability(args) => {
                    commands::handle_capability(&config, &args.name).await
                }
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
