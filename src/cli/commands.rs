//! CLI command handlers.

use std::sync::Arc;

use crate::api::devices::{DeviceDetail, Devices};
use crate::api::endpoint::{self, Endpoint};
use crate::api::http::SmartThingsClient;
use crate::auth::{AuthService, FileTokenStore, Token};
use crate::config::SmartThingsConfig;
use crate::error::Result;

/// Load or obtain a token for `config`, printing the login URL if needed.
pub async fn acquire_token(config: &SmartThingsConfig) -> Result<Token> {
    let store = Arc::new(FileTokenStore::from_name(&config.token_file_name()?)?);
    let service = AuthService::new(store)
        .with_port(config.port())
        .with_login_prompt(|url| println!("Please login by visiting {url}"));
    Ok(service.get_token(&config.oauth_config()).await?)
}

async fn connect(config: &SmartThingsConfig) -> Result<(SmartThingsClient, Endpoint)> {
    let token = acquire_token(config).await?;
    let client = SmartThingsClient::new(token);
    let endpoint = endpoint::resolve(&client).await?;
    Ok((client, endpoint))
}

/// Handle `smartthings login`.
pub async fn handle_login(config: &SmartThingsConfig) -> Result<()> {
    let token = acquire_token(config).await?;
    match token.expires_at() {
        Some(expiry) => println!("Token valid until {}", expiry.format("%Y-%m-%d %H:%M")),
        None => println!("Token saved (no expiry)"),
    }
    Ok(())
}

/// Handle `smartthings devices [--all]`.
pub async fn handle_devices(config: &SmartThingsConfig, all: bool) -> Result<()> {
    let (client, endpoint) = connect(config).await?;
    let devices = Devices::new(&client, &endpoint);
    for summary in devices.list_devices().await? {
        if all {
            print_device(&devices.get_device(&summary.id).await?);
        } else {
            println!("{}  {}  {}", summary.id, summary.name, summary.display_name);
        }
    }
    Ok(())
}

/// Handle `smartthings device --device <id>`.
pub async fn handle_device(config: &SmartThingsConfig, id: &str) -> Result<()> {
    let (client, endpoint) = connect(config).await?;
    let devices = Devices::new(&client, &endpoint);
    print_device(&devices.get_device(id).await?);
    let commands = devices.get_device_commands(id).await?;
    if !commands.is_empty() {
        println!("  Commands:");
        for command in commands {
            if command.params.is_empty() {
                println!("    {}", command.command);
            } else {
                let params = serde_json::to_string(&command.params)?;
                println!("    {} {params}", command.command);
            }
        }
    }
    Ok(())
}

/// Handle `smartthings capability <name>`.
pub async fn handle_capability(config: &SmartThingsConfig, name: &str) -> Result<()> {
    let (client, endpoint) = connect(config).await?;
    let body = Devices::new(&client, &endpoint)
        .get_capability_raw(name)
        .await?;
    println!("{} content: {}", name, String::from_utf8_lossy(&body));
    Ok(())
}

fn print_device(detail: &DeviceDetail) {
    println!("ID:           {}", detail.summary.id);
    println!("Name:         {}", detail.summary.name);
    println!("Display Name: {}", detail.summary.display_name);
    if !detail.attributes.is_empty() {
        println!("  Attributes:");
        for (name, value) in &detail.attributes {
            println!("    {name}: {value}");
        }
    }
}
