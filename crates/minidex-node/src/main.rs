use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod client;
mod config;
mod deploy;
mod interact;
mod node;
mod verify;

use cli::{Cli, Commands, NetworkArgs};
use client::RpcClient;
use config::{explorer_api_key, generate_sample_config, signer_from_env, NodeConfig};
use node::Node;

#[tokio::main]
async fn main() {
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run { config } => run_node(&config).await,
        Commands::Init { output } => init_config(&output),
        Commands::Keygen { output } => generate_keypair(output),
        Commands::Status { net } => {
            let (_, client) = connect(&net)?;
            let status = client.status().await?;
            println!("Node Status:");
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::DeployTokens { net } => {
            let signer = signer_from_env()?;
            let (config, client) = connect(&net)?;
            deploy::deploy_tokens(&client, &signer, &config.deployments_path).await?;
            Ok(())
        }
        Commands::DeployDex { net } => {
            let signer = signer_from_env()?;
            let (config, client) = connect(&net)?;
            deploy::deploy_dex(&client, &signer, &config.deployments_path).await?;
            Ok(())
        }
        Commands::Interact { net } => {
            let signer = signer_from_env()?;
            let (config, client) = connect(&net)?;
            interact::interact(&client, &signer, &config.deployments_path).await
        }
        Commands::Verify { net } => {
            let (config, client) = connect(&net)?;
            let explorer = config.network(&net.network)?.explorer_url.clone();
            verify::verify_contracts(
                &client,
                &config.deployments_path,
                explorer.as_deref(),
                &explorer_api_key(),
            )
            .await
        }
        Commands::Pool { net, amount } => {
            let (config, client) = connect(&net)?;
            interact::show_pool(&client, &config.deployments_path, &amount).await
        }
    }
}

/// Resolve the named network and build a client for it
fn connect(net: &NetworkArgs) -> Result<(NodeConfig, RpcClient)> {
    let config = NodeConfig::load_or_default(&net.config)?;
    let client = RpcClient::new(&config.network(&net.network)?.rpc_url);
    info!("Using network '{}'", net.network);
    Ok((config, client))
}

/// Run a minidex node
async fn run_node(config_path: &Path) -> Result<()> {
    info!("Loading configuration from {:?}", config_path);

    if !config_path.exists() {
        bail!(
            "Configuration file not found: {:?}. Run 'minidex init' to create one.",
            config_path
        );
    }

    let config = NodeConfig::load(config_path)?;
    let node = Node::new(config)?;
    node.run().await
}

/// Initialize a new configuration file
fn init_config(output: &Path) -> Result<()> {
    info!("Generating sample configuration");

    let config = generate_sample_config();
    config.save(output)?;

    println!("\nConfiguration file created: {}", output.display());
    println!("Edit the file to customize your node settings.");
    println!("\nTo start the node, run:");
    println!("  minidex run --config {}", output.display());

    Ok(())
}

/// Generate a new keypair
fn generate_keypair(output: Option<PathBuf>) -> Result<()> {
    let keypair = minidex_core::KeyPair::generate();

    println!("Generated new keypair:");
    println!("  Address:     {}", keypair.address());
    println!("  Public key:  {}", keypair.public.to_hex());
    println!("  Secret key:  {}", keypair.secret.to_hex());

    if let Some(path) = output {
        std::fs::write(&path, keypair.secret.to_hex())?;
        info!("Secret key saved to {:?}", path);
    }

    println!("\nExport it as {} to use the deploy commands.", config::PRIVATE_KEY_ENV);

    Ok(())
}
