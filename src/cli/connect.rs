//! Connection and verification command

use colored::Colorize;
use gatehop_core::config::TomlConfig;
use gatehop_core::error::Result;
use gatehop_core::vpn::{ConnectionProfile, Orchestrator};
use std::path::Path;
use tracing::info;

/// Run the connect command against one profile
pub async fn run_connect(config: &TomlConfig, profile: &Path) -> Result<()> {
    let profile = ConnectionProfile::new(profile)?;
    let orchestrator = Orchestrator::new(config.connection.clone())?;

    info!(profile = %profile.path().display(), "Starting connection run");
    let outcome = orchestrator.run(&profile).await?;

    if outcome.verified {
        println!("{}", "VPN connection established and verified".green());
    }
    println!(
        "  outbound address: {} -> {}",
        outcome.pre_address, outcome.post_address
    );
    if let Some(at) = outcome.established_at {
        println!("  established at:   {}", at.to_rfc3339());
    }
    Ok(())
}
