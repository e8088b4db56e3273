use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Minidex - a minimal constant-product exchange ledger
#[derive(Parser)]
#[command(name = "minidex")]
#[command(about = "Minidex node and operator tooling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the commands that talk to a running node
#[derive(clap::Args, Debug, Clone)]
pub struct NetworkArgs {
    /// Network name from the configuration file
    #[arg(short, long, default_value = "localhost")]
    pub network: String,

    /// Path to configuration file; defaults are used when it is missing
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a minidex node
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Initialize a new node configuration
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Generate a new keypair
    Keygen {
        /// Output file for secret key
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show node status
    Status {
        #[command(flatten)]
        net: NetworkArgs,
    },

    /// Deploy the two mock tokens and record their addresses
    DeployTokens {
        #[command(flatten)]
        net: NetworkArgs,
    },

    /// Deploy the exchange using the recorded tokens
    DeployDex {
        #[command(flatten)]
        net: NetworkArgs,
    },

    /// Approve, add liquidity and swap against the recorded deployment
    Interact {
        #[command(flatten)]
        net: NetworkArgs,
    },

    /// Submit the recorded contracts for source verification
    Verify {
        #[command(flatten)]
        net: NetworkArgs,
    },

    /// Show the recorded pool and a sample quote
    Pool {
        #[command(flatten)]
        net: NetworkArgs,

        /// Amount of token A to quote, in whole tokens
        #[arg(long, default_value = "10")]
        amount: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_network_defaults() {
        let cli = Cli::parse_from(["minidex", "deploy-tokens"]);
        match cli.command {
            Commands::DeployTokens { net } => {
                assert_eq!(net.network, "localhost");
                assert_eq!(net.config, PathBuf::from("config.json"));
            }
            _ => panic!("Wrong command"),
        }
    }

    #[test]
    fn test_pool_amount_flag() {
        let cli = Cli::parse_from([
            "minidex",
            "pool",
            "--network",
            "testnet",
            "--amount",
            "2.5",
        ]);
        match cli.command {
            Commands::Pool { net, amount } => {
                assert_eq!(net.network, "testnet");
                assert_eq!(amount, "2.5");
            }
            _ => panic!("Wrong command"),
        }
    }
}
