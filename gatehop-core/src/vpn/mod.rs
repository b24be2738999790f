//! VPN connection module
//!
//! Handles OpenVPN client supervision, control channel polling, and tunnel
//! verification.

pub mod connectivity;
pub mod control;
pub mod orchestrator;
pub mod probe;
pub mod supervisor;

// Public re-exports
pub use connectivity::ConnectivityChecker;
pub use control::ControlPoller;
pub use orchestrator::{ConnectionOutcome, ConnectionProfile, Orchestrator};
pub use probe::AddressProber;
pub use supervisor::{LogSink, StreamSource, TracingSink, VpnProcess};
