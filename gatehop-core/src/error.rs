//! Error types for the gatehop VPN tool
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the gatehop application
#[derive(Error, Debug)]
pub enum GatehopError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to the relay directory feed
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Errors related to VPN connection and verification
    #[error("VPN error: {0}")]
    Vpn(#[from] VpnError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Connection profile not found: {path}")]
    ProfileNotFound { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Relay directory feed errors
///
/// The directory half has no recovery logic of its own; every failure here
/// propagates straight up and aborts the fetch.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to download relay feed from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Malformed relay feed: {reason}")]
    MalformedFeed { reason: String },

    #[error("Failed to decode profile for relay {addr}: {reason}")]
    ProfileDecode { addr: String, reason: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// VPN connection and verification errors
///
/// Every variant is fatal to the run. Transient failures inside the control
/// channel poll loop are retried internally and never surface here; a poll
/// loop that exhausts its deadline surfaces as `PollTimeout`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VpnError {
    #[error("Environment error: {reason}")]
    Environment { reason: String },

    #[error("Failed to launch VPN client: {reason}")]
    Launch { reason: String },

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Control channel did not report success within {seconds} seconds")]
    PollTimeout { seconds: u64 },

    #[error("Tunnel verification failed: {reason}")]
    Verification { reason: String },

    #[error("Failed to terminate VPN client process")]
    Termination,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GatehopError>;
