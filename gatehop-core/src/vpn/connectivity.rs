//! Tunnel reachability checking via HTTP/HTTPS
//!
//! Verifies that a well-known endpoint is reachable through the tunnel.
//! This is a boolean health signal, not a diagnostic; callers needing detail
//! must instrument separately.

use crate::error::{GatehopError, VpnError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Performs a reachability check against a fixed well-known URL
#[derive(Debug)]
pub struct ConnectivityChecker {
    client: Client,
    endpoint: String,
}

impl ConnectivityChecker {
    /// Create a new connectivity checker
    ///
    /// # Arguments
    /// * `endpoint` - HTTP/HTTPS URL to check (must use http:// or https:// scheme)
    /// * `timeout` - Maximum duration to wait for a response
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GatehopError> {
        let url = Url::parse(endpoint).map_err(|e| VpnError::Network {
            reason: format!("Invalid connectivity URL {}: {}", endpoint, e),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(VpnError::Network {
                    reason: format!(
                        "Only HTTP/HTTPS connectivity endpoints are supported, got: {}",
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

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Check whether the endpoint answers with 200 OK
    ///
    /// Returns true only if the request succeeds transport-wise AND the
    /// response status is exactly OK. Transport errors and every other
    /// status collapse to false.
    pub async fn check(&self) -> bool {
        match self.client.get(&self.endpoint).send().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::OK {
                    debug!(endpoint = %self.endpoint, "Connectivity check succeeded");
                    true
                } else {
                    warn!(
                        endpoint = %self.endpoint,
                        status = %status,
                        "Connectivity check failed with non-OK status"
                    );
                    false
                }
            }
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Connectivity check request failed"
                );
                false
            }
        }
    }
}
