//! gatehop - VPN Gate relay selection and tunnel verification
//!
//! Downloads the public relay directory, materializes ranked OpenVPN
//! profiles, and verifies that a tunnel to a chosen relay actually carries
//! traffic before declaring success.

use clap::{Parser, Subcommand};
use gatehop_core::error::GatehopError;
use gatehop_core::init_logging;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "gatehop")]
#[command(about = "Pick a VPN Gate relay and verify the tunnel carries traffic")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the relay directory and write ranked connection profiles
    Fetch,
    /// Connect to a relay profile and verify the tunnel end to end
    Connect {
        /// Path to the .ovpn connection profile
        profile: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Fetch => cli::fetch::run_fetch(&config).await,
        Commands::Connect { profile } => cli::connect::run_connect(&config, &profile).await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                GatehopError::Config(_) | GatehopError::Toml(_) | GatehopError::TomlSerialize(_) => 2,
                // Environment errors are setup problems, everything else is runtime
                GatehopError::Vpn(ref vpn_error) => match vpn_error {
                    gatehop_core::error::VpnError::Environment { .. } => 2,
                    _ => 1,
                },
                // Directory fetch and IO errors (exit code 1 - runtime)
                GatehopError::Directory(_) | GatehopError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
