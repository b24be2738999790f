//! Outbound address probing
//!
//! Observes the caller's public address via an external echo endpoint. The
//! same probe runs before and after tunnel establishment; a changed address
//! is the primary signal that traffic is routed through the tunnel.

use crate::error::{GatehopError, VpnError};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Observes the public outbound address via an HTTP echo endpoint
#[derive(Debug)]
pub struct AddressProber {
    client: Client,
    url: Url,
}

impl AddressProber {
    /// Create a new prober
    ///
    /// # Arguments
    /// * `probe_url` - HTTP/HTTPS endpoint returning the caller's address as its body
    /// * `timeout` - Maximum duration to wait for a response
    pub fn new(probe_url: &str, timeout: Duration) -> Result<Self, GatehopError> {
        let url = Url::parse(probe_url).map_err(|e| VpnError::Network {
            reason: format!("Invalid probe URL {}: {}", probe_url, e),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(VpnError::Network {
                    reason: format!(
                        "Only HTTP/HTTPS probe endpoints are supported, got: {}",
                        scheme
                    ),
                }
                .into());
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| VpnError::Network {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, url })
    }

    /// Resolve the probe host before issuing the request
    ///
    /// An unresolvable probe host means the environment itself is broken, so
    /// this fails with an environment error rather than a network one.
    async fn dns_precheck(&self) -> Result<(), GatehopError> {
        let host = self.url.host_str().ok_or_else(|| VpnError::Network {
            reason: format!("Probe URL {} has no host", self.url),
        })?;
        let port = self.url.port_or_known_default().unwrap_or(80);

        tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| VpnError::Environment {
                reason: format!("Failed to resolve probe host {}: {}", host, e),
            })?;

        Ok(())
    }

    /// Observe the current public outbound address
    ///
    /// Issues a single request; transport failures are fatal to the caller.
    /// Retries, if desired, are the caller's responsibility.
    pub async fn observe(&self) -> Result<String, GatehopError> {
        self.dns_precheck().await?;

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| VpnError::Network {
                reason: format!("Address probe request failed: {}", e),
            })?;

        let body = response.text().await.map_err(|e| VpnError::Network {
            reason: format!("Failed to read probe response body: {}", e),
        })?;

        let address = body.trim().to_string();
        debug!(address = %address, "Observed outbound address");
        Ok(address)
    }
}
