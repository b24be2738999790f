//! VPN client process supervision
//!
//! Spawns the OpenVPN client against a connection profile and drains its two
//! diagnostic streams concurrently so the child never blocks on a full pipe.

use crate::config::ConnectionSettings;
use crate::error::{GatehopError, VpnError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Origin of a diagnostic output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamSource::Stdout => write!(f, "stdout"),
            StreamSource::Stderr => write!(f, "stderr"),
        }
    }
}

/// Sink for client diagnostic output, one callback per line
///
/// Must be safe for concurrent writes: both stream drains log through the
/// same sink.
pub trait LogSink: Send + Sync {
    fn log(&self, source: StreamSource, line: &str);
}

/// Default sink forwarding client output to tracing, tagged by stream
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, source: StreamSource, line: &str) {
        match source {
            StreamSource::Stdout => info!(stream = "stdout", "openvpn: {}", line),
            StreamSource::Stderr => warn!(stream = "stderr", "openvpn: {}", line),
        }
    }
}

/// Resolve the DNS update hook script from the configured candidates
///
/// The hook is required for correct DNS handling inside the tunnel and has
/// no safe no-op default, so a missing hook aborts the run.
pub fn resolve_hook(candidates: &[PathBuf]) -> Result<PathBuf, GatehopError> {
    for candidate in candidates {
        if candidate.is_file() {
            debug!(hook = %candidate.display(), "Resolved DNS update hook");
            return Ok(candidate.clone());
        }
    }

    Err(VpnError::Environment {
        reason: format!(
            "no DNS update hook found among {} candidate path(s)",
            candidates.len()
        ),
    }
    .into())
}

fn drain<R>(stream: R, source: StreamSource, sink: Arc<dyn LogSink>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.log(source, &line);
        }
        debug!(stream = %source, "Client output stream closed");
    })
}

/// Launch the VPN client against a connection profile
///
/// The client is started with its management interface on the configured
/// control endpoint and the DNS hook wired to both the up and down events;
/// script security level 2 permits hook execution. Both diagnostic streams
/// are drained into `sink` for the lifetime of the process.
pub fn launch(
    profile: &Path,
    settings: &ConnectionSettings,
    sink: Arc<dyn LogSink>,
) -> Result<VpnProcess, GatehopError> {
    let hook = resolve_hook(&settings.hook_candidates)?;

    let program = which::which(&settings.client_program).map_err(|e| VpnError::Launch {
        reason: format!("{} not found: {}", settings.client_program, e),
    })?;

    let mut cmd = Command::new(&program);
    cmd.arg("--config")
        .arg(profile)
        .arg("--management")
        .arg(&settings.control.host)
        .arg(settings.control.port.to_string())
        .arg("--script-security")
        .arg("2")
        .arg("--up")
        .arg(&hook)
        .arg("--down")
        .arg(&hook)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| VpnError::Launch {
        reason: format!("Failed to spawn {}: {}", program.display(), e),
    })?;

    info!(
        pid = child.id(),
        profile = %profile.display(),
        control = %settings.control,
        "VPN client spawned"
    );

    let stdout = child.stdout.take().ok_or_else(|| VpnError::Launch {
        reason: "Failed to capture stdout".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| VpnError::Launch {
        reason: "Failed to capture stderr".to_string(),
    })?;

    let drains = vec![
        drain(stdout, StreamSource::Stdout, Arc::clone(&sink)),
        drain(stderr, StreamSource::Stderr, sink),
    ];

    Ok(VpnProcess { child, drains })
}

/// Handle to the running VPN client
///
/// Owns the child process and its two stream drain tasks. The drains exit on
/// their own once the child closes its streams; `terminate` additionally
/// awaits them so no task outlives a run.
pub struct VpnProcess {
    child: Child,
    drains: Vec<JoinHandle<()>>,
}

impl VpnProcess {
    /// OS process id, if the child has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit on its own
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Terminate the client: SIGTERM, bounded wait, then SIGKILL
    ///
    /// Safe to call on an already-exited process. Awaits both stream drains
    /// before returning.
    pub async fn terminate(&mut self) -> Result<(), GatehopError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid_num) = self.child.id() {
            let pid = Pid::from_raw(pid_num as i32);

            if let Err(e) = kill(pid, Signal::SIGTERM) {
                debug!(error = %e, "SIGTERM not delivered, client may have already exited");
            }

            let mut exited = false;
            for _ in 0..10 {
                match self.child.try_wait() {
                    Ok(Some(status)) => {
                        info!(%status, "VPN client terminated");
                        exited = true;
                        break;
                    }
                    Ok(None) => sleep(Duration::from_millis(500)).await,
                    Err(e) => {
                        warn!(error = %e, "Failed to poll VPN client exit status");
                        break;
                    }
                }
            }

            if !exited {
                warn!("VPN client did not exit after SIGTERM, sending SIGKILL");
                kill(pid, Signal::SIGKILL)
                    .map_err(|_| GatehopError::Vpn(VpnError::Termination))?;
                self.child
                    .wait()
                    .await
                    .map_err(|_| GatehopError::Vpn(VpnError::Termination))?;
            }
        }

        for handle in self.drains.drain(..) {
            let _ = handle.await;
        }

        Ok(())
    }
}
