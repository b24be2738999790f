//! Control channel polling
//!
//! Talks to the OpenVPN management interface over its line-oriented text
//! protocol: open a short-lived connection, send a `state` query, scan the
//! reply for the connected marker. Every attempt uses a fresh connection.

use crate::config::{ConnectionSettings, ControlEndpoint};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Substring in the management state reply indicating an active tunnel
const CONNECTED_MARKER: &str = "CONNECTED,SUCCESS";

/// Status query line sent on every attempt
const STATE_QUERY: &[u8] = b"state\n";

/// Per-attempt connect/read deadline, materially shorter than the overall
/// timeout so a hung attempt cannot eat the whole deadline
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on bytes read per attempt; longer replies are scanned only up
/// to this boundary
const RESPONSE_BUFFER: usize = 4096;

/// Polls the client management interface until the tunnel is up
#[derive(Debug, Clone)]
pub struct ControlPoller {
    endpoint: ControlEndpoint,
    connect_timeout: Duration,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl ControlPoller {
    pub fn new(
        endpoint: ControlEndpoint,
        connect_timeout: Duration,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            endpoint,
            connect_timeout,
            poll_interval,
            settle_delay,
        }
    }

    pub fn from_settings(settings: &ConnectionSettings) -> Self {
        Self::new(
            settings.control.clone(),
            settings.connect_timeout(),
            settings.poll_interval(),
            settings.settle_delay(),
        )
    }

    /// One poll attempt: connect, query, read, scan
    ///
    /// Connection refused, write failures, read errors, and silent peers all
    /// collapse to false; the caller retries. The connection is dropped at
    /// the end of every attempt.
    async fn attempt(&self) -> bool {
        let addr = (self.endpoint.host.as_str(), self.endpoint.port);
        let mut stream = match timeout(ATTEMPT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(endpoint = %self.endpoint, error = %e, "Control channel not accepting connections");
                return false;
            }
            Err(_) => {
                debug!(endpoint = %self.endpoint, "Control channel connect timed out");
                return false;
            }
        };

        if let Err(e) = stream.write_all(STATE_QUERY).await {
            warn!(error = %e, "Failed to write status query to control channel");
            return false;
        }

        let mut buf = vec![0u8; RESPONSE_BUFFER];
        let n = match timeout(ATTEMPT_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!(error = %e, "Error reading from control channel");
                0
            }
            Err(_) => {
                debug!("Control channel reply timed out");
                0
            }
        };

        if n == 0 {
            return false;
        }

        let response = String::from_utf8_lossy(&buf[..n]);
        debug!(response = %response.trim_end(), "Control channel state reply");
        response.contains(CONNECTED_MARKER)
    }

    /// Poll until the tunnel is reported up, or the overall deadline passes
    ///
    /// After the connected marker is first observed, the configured settle
    /// delay is applied before returning true: the management interface
    /// reports success before the OS route table and DNS state inside the
    /// tunnel are guaranteed consistent.
    pub async fn wait_for_connected(&self) -> bool {
        let deadline = Instant::now() + self.connect_timeout;

        while Instant::now() < deadline {
            if self.attempt().await {
                info!(
                    settle_secs = self.settle_delay.as_secs(),
                    "Tunnel reported up, waiting for routes to settle"
                );
                sleep(self.settle_delay).await;
                return true;
            }

            debug!("Tunnel not up yet, retrying");
            sleep(self.poll_interval).await;
        }

        warn!(
            timeout_secs = self.connect_timeout.as_secs(),
            "Control channel never reported an established tunnel"
        );
        false
    }
}
