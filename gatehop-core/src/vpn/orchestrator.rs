//! Connection orchestration
//!
//! Sequences the verification run: baseline address, client launch, control
//! channel polling, post-connection address comparison, reachability check.
//! Every step waits for the previous one; any failure aborts the whole run.

use crate::config::ConnectionSettings;
use crate::error::{ConfigError, GatehopError, Result, VpnError};
use crate::vpn::connectivity::ConnectivityChecker;
use crate::vpn::control::ControlPoller;
use crate::vpn::probe::AddressProber;
use crate::vpn::supervisor::{self, LogSink, TracingSink};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Timeout for individual probe/connectivity HTTP requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A connection profile referencing one VPN relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    path: PathBuf,
}

impl ConnectionProfile {
    /// Reference an existing profile file on disk
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ConfigError::ProfileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of a single connection and verification run
///
/// Built incrementally over the run and immutable once it concludes. Not
/// persisted anywhere; each run produces a fresh outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    /// When the control channel first reported an established tunnel
    pub established_at: Option<DateTime<Utc>>,

    /// Outbound address observed before the client was launched
    pub pre_address: String,

    /// Outbound address observed through the tunnel
    pub post_address: String,

    /// True only when the control channel reported success AND the outbound
    /// address changed AND the reachability check passed
    pub verified: bool,
}

/// Drives a single connection attempt end to end
pub struct Orchestrator {
    settings: ConnectionSettings,
    prober: AddressProber,
    checker: ConnectivityChecker,
    sink: Arc<dyn LogSink>,
}

impl Orchestrator {
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        Self::with_sink(settings, Arc::new(TracingSink))
    }

    /// Construct with a custom diagnostic sink for the client's output
    pub fn with_sink(settings: ConnectionSettings, sink: Arc<dyn LogSink>) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| GatehopError::Config(ConfigError::ValidationError { message: e }))?;

        let prober = AddressProber::new(&settings.probe_url, HTTP_TIMEOUT)?;
        let checker = ConnectivityChecker::new(&settings.connectivity_url, HTTP_TIMEOUT)?;

        Ok(Self {
            settings,
            prober,
            checker,
            sink,
        })
    }

    /// Run the connection and verification sequence against one profile
    ///
    /// The client process is torn down on every exit path, success included:
    /// the run verifies the relay, it does not hold the tunnel open.
    pub async fn run(&self, profile: &ConnectionProfile) -> Result<ConnectionOutcome> {
        let pre_address = self.prober.observe().await?;
        info!(address = %pre_address, "Outbound address before connecting");

        let mut process =
            supervisor::launch(profile.path(), &self.settings, Arc::clone(&self.sink))?;

        let poller = ControlPoller::from_settings(&self.settings);
        if !poller.wait_for_connected().await {
            let _ = process.terminate().await;
            return Err(VpnError::PollTimeout {
                seconds: self.settings.connect_timeout_secs,
            }
            .into());
        }
        let established_at = Some(Utc::now());

        let verdict = self.verify(&pre_address).await;
        if let Err(e) = process.terminate().await {
            warn!(error = %e, "Failed to tear down VPN client cleanly");
        }
        let post_address = verdict?;

        info!(
            pre = %pre_address,
            post = %post_address,
            "Tunnel verified, outbound address changed"
        );

        Ok(ConnectionOutcome {
            established_at,
            pre_address,
            post_address,
            verified: true,
        })
    }

    /// Post-connection verification: probe again, compare addresses, then
    /// check reachability. Runs while the tunnel is still up.
    async fn verify(&self, pre_address: &str) -> Result<String> {
        let post_address = self.prober.observe().await?;
        info!(address = %post_address, "Outbound address through the tunnel");

        if post_address == pre_address {
            return Err(VpnError::Verification {
                reason: format!("outbound address did not change ({})", pre_address),
            }
            .into());
        }

        if !self.checker.check().await {
            return Err(VpnError::Verification {
                reason: format!(
                    "cannot reach {} through the tunnel",
                    self.settings.connectivity_url
                ),
            }
            .into());
        }

        Ok(post_address)
    }
}
