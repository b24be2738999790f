//! Configuration module
//!
//! Handles the explicit settings structures for the relay directory fetch
//! and the connection/verification run, plus TOML file I/O.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod toml_config;

pub use toml_config::TomlConfig;

/// Local control channel endpoint of the VPN client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEndpoint {
    /// Host the client binds its management interface to
    pub host: String,

    /// Management interface port
    pub port: u16,
}

impl ControlEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ControlEndpoint {
    fn default() -> Self {
        Self::new("127.0.0.1", 7505)
    }
}

impl std::fmt::Display for ControlEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Settings for the connection and verification run
///
/// All timing knobs of the verification state machine live here so the
/// orchestrator carries no hard-coded constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// VPN client executable name or path
    pub client_program: String,

    /// Management interface endpoint passed to the client
    pub control: ControlEndpoint,

    /// Overall deadline for the control channel to report success, in seconds
    pub connect_timeout_secs: u64,

    /// Backoff between control channel poll attempts, in seconds
    pub poll_interval_secs: u64,

    /// Pause after the success marker before trusting the tunnel, in seconds
    ///
    /// The management interface reports success before the OS route table is
    /// guaranteed consistent.
    pub settle_delay_secs: u64,

    /// Candidate paths for the DNS update hook, checked in order
    pub hook_candidates: Vec<PathBuf>,

    /// Endpoint that echoes the caller's public address
    pub probe_url: String,

    /// Well-known endpoint used for the post-connection reachability check
    pub connectivity_url: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            client_program: "openvpn".to_string(),
            control: ControlEndpoint::default(),
            connect_timeout_secs: 60,
            poll_interval_secs: 1,
            settle_delay_secs: 20,
            hook_candidates: vec![
                PathBuf::from("/etc/openvpn/update-resolv-conf"),
                PathBuf::from("/etc/openvpn/up.sh"),
            ],
            probe_url: "http://ifconfig.me".to_string(),
            connectivity_url: "https://www.google.com".to_string(),
        }
    }
}

impl ConnectionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.client_program.is_empty() {
            return Err("Client program cannot be empty".to_string());
        }

        if self.control.host.is_empty() {
            return Err("Control host cannot be empty".to_string());
        }

        if self.control.port == 0 {
            return Err("Control port cannot be zero".to_string());
        }

        if self.connect_timeout_secs == 0 {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.hook_candidates.is_empty() {
            return Err("At least one hook candidate path is required".to_string());
        }

        if self.probe_url.is_empty() {
            return Err("Probe URL cannot be empty".to_string());
        }

        if self.connectivity_url.is_empty() {
            return Err("Connectivity URL cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Settings for the relay directory fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    /// URL of the public relay feed (CSV)
    pub feed_url: String,

    /// Country codes to keep; relays from other countries are dropped
    pub countries: Vec<String>,

    /// Directory under which the dated profile directory is created
    pub output_root: PathBuf,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            feed_url: "http://www.vpngate.net/api/iphone/".to_string(),
            countries: vec!["JP".to_string(), "US".to_string()],
            output_root: PathBuf::from("."),
        }
    }
}

impl DirectorySettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.feed_url.is_empty() {
            return Err("Feed URL cannot be empty".to_string());
        }

        if self.countries.is_empty() {
            return Err("At least one country code is required".to_string());
        }

        if self.countries.iter().any(|c| c.is_empty()) {
            return Err("Country codes cannot be empty".to_string());
        }

        Ok(())
    }
}
