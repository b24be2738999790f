//! Relay directory fetch
//!
//! Downloads the public relay feed, filters relays by country, ranks them
//! descending by score, and materializes decoded OpenVPN profiles to disk.
//! Plain file and network I/O; failures propagate without retry.

use crate::config::DirectorySettings;
use crate::error::{DirectoryError, GatehopError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One relay row from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// Two-letter country code
    pub country: String,

    /// Quality score assigned by the feed; higher is better
    pub score: i64,

    /// Relay address
    pub addr: String,

    /// Base64-encoded OpenVPN configuration blob
    pub config_base64: String,
}

/// Download the relay feed CSV
pub async fn fetch_feed(url: &str) -> Result<String> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| DirectoryError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let body = response
        .text()
        .await
        .map_err(|e| DirectoryError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(body)
}

fn find_column(header: &StringRecord, name: &str) -> Result<usize> {
    header
        .iter()
        .position(|field| field.trim_start_matches('#') == name)
        .ok_or_else(|| {
            GatehopError::Directory(DirectoryError::MalformedFeed {
                reason: format!("missing column {}", name),
            })
        })
}

/// Parse the feed, keeping relays from the requested countries, ranked
/// descending by score
///
/// The feed carries a banner row before the header and a trailing `*` row;
/// both are skipped, as are rows too short to carry the needed columns.
pub fn parse_relays(feed: &str, countries: &[String]) -> Result<Vec<Relay>> {
    let malformed = |e: csv::Error| {
        GatehopError::Directory(DirectoryError::MalformedFeed {
            reason: e.to_string(),
        })
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(feed.as_bytes());

    let mut records = reader.records();

    // Banner row before the real header
    records.next().transpose().map_err(malformed)?;

    let header = records.next().transpose().map_err(malformed)?.ok_or_else(|| {
        GatehopError::Directory(DirectoryError::MalformedFeed {
            reason: "missing header row".to_string(),
        })
    })?;

    let country_idx = find_column(&header, "CountryShort")?;
    let score_idx = find_column(&header, "Score")?;
    let ip_idx = find_column(&header, "IP")?;
    let config_idx = find_column(&header, "OpenVPN_ConfigData_Base64")?;
    let needed = country_idx.max(score_idx).max(ip_idx).max(config_idx);

    let mut relays = Vec::new();
    for record in records {
        let record = record.map_err(malformed)?;
        if record.len() <= needed {
            continue;
        }

        let country = &record[country_idx];
        if !countries.iter().any(|c| c == country) {
            continue;
        }

        relays.push(Relay {
            country: country.to_string(),
            score: record[score_idx].parse().unwrap_or(0),
            addr: record[ip_idx].to_string(),
            config_base64: record[config_idx].to_string(),
        });
    }

    relays.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(relays)
}

/// Decode and write ranked profiles as `<rank>---<addr>.ovpn`
pub fn write_profiles(relays: &[Relay], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(relays.len());

    for (rank, relay) in relays.iter().enumerate() {
        let decoded = BASE64.decode(relay.config_base64.as_bytes()).map_err(|e| {
            DirectoryError::ProfileDecode {
                addr: relay.addr.clone(),
                reason: e.to_string(),
            }
        })?;

        let path = dir.join(format!("{}---{}.ovpn", rank, relay.addr));
        std::fs::write(&path, decoded).map_err(|e| DirectoryError::IoError {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;

        debug!(path = %path.display(), "Wrote connection profile");
        paths.push(path);
    }

    Ok(paths)
}

/// Fetch the feed and materialize profiles under a fresh dated directory
///
/// Any existing directory for today is replaced. Returns the written profile
/// paths in rank order, best relay first.
pub async fn sync_to_disk(settings: &DirectorySettings) -> Result<Vec<PathBuf>> {
    let dir = settings
        .output_root
        .join(Local::now().format("%Y%m%d").to_string());

    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| DirectoryError::IoError {
            message: format!("Failed to remove {}: {}", dir.display(), e),
        })?;
        info!(dir = %dir.display(), "Removed existing profile directory");
    }

    std::fs::create_dir_all(&dir).map_err(|e| DirectoryError::IoError {
        message: format!("Failed to create {}: {}", dir.display(), e),
    })?;

    let feed = fetch_feed(&settings.feed_url).await?;
    let relays = parse_relays(&feed, &settings.countries)?;

    for relay in &relays {
        info!(
            country = %relay.country,
            score = relay.score,
            addr = %relay.addr,
            "Relay"
        );
    }

    let paths = write_profiles(&relays, &dir)?;
    info!(count = paths.len(), dir = %dir.display(), "Profile directory ready");
    Ok(paths)
}
