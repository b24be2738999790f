//! Relay directory fetch command

use colored::Colorize;
use gatehop_core::config::TomlConfig;
use gatehop_core::directory;
use gatehop_core::error::Result;
use tracing::info;

/// Run the fetch command
pub async fn run_fetch(config: &TomlConfig) -> Result<()> {
    info!(url = %config.directory.feed_url, "Downloading relay directory");
    let paths = directory::sync_to_disk(&config.directory).await?;

    if paths.is_empty() {
        println!(
            "{}",
            "No relays matched the configured countries".yellow()
        );
        return Ok(());
    }

    println!("Wrote {} connection profiles:", paths.len());
    for path in &paths {
        println!("  {}", path.display());
    }
    println!();
    println!("{}", "Best-ranked relay is first; connect with:".green());
    println!("  gatehop connect {}", paths[0].display());
    Ok(())
}
