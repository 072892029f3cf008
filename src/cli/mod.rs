//! CLI entry point for the SmartThings client.

pub mod commands;

use clap::{Args, Parser, Subcommand};

use crate::config::SmartThingsConfig;

/// SmartThings CLI
#[derive(Parser, Debug)]
#[command(name = "smartthings", version, about = "SmartThings API client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials and token file, shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// OAuth client id
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// OAuth client secret
    #[arg(long, global = true)]
    pub secret: Option<String>,

    /// Token file name (relative names live in the home directory)
    #[arg(long, global = true)]
    pub tokenfile: Option<String>,

    /// Local port for the OAuth callback server
    #[arg(long, global = true)]
    pub port: Option<u16>,
}

impl GlobalArgs {
    /// Apply flags on top of the environment configuration.
    pub fn apply(&self, mut config: SmartThingsConfig) -> SmartThingsConfig {
        if let Some(client) = &self.client {
            config = config.with_client_id(client.clone());
        }
        if let Some(secret) = &self.secret {
            config = config.with_client_secret(secret.clone());
        }
        if let Some(file) = &self.tokenfile {
            config = config.with_token_file(file.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        config
    }
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain (or reuse) a token and save it
    Login,
    /// List devices
    Devices(DevicesArgs),
    /// Show one device with its commands
    Device(DeviceArgs),
    /// Print the raw output of a capability endpoint (e.g. temperature)
    Capability(CapabilityArgs),
}

/// Arguments for `smartthings devices`.
#[derive(Args, Debug)]
pub struct DevicesArgs {
    /// Show details for all devices
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `smartthings device`.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Device id
    #[arg(long = "device")]
    pub id: String,
}

/// Arguments for `smartthings capability`.
#[derive(Args, Debug)]
pub struct CapabilityArgs {
    /// Capability path, e.g. temperature or battery
    pub name: String,
}
