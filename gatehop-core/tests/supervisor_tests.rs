//! Integration tests for VPN client process supervision
//!
//! Uses throwaway shell scripts as stand-ins for the real client so the
//! tests exercise spawning, stream draining, and termination without an
//! openvpn binary.

use gatehop_core::config::ConnectionSettings;
use gatehop_core::vpn::supervisor::{self, LogSink, StreamSource};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Sink collecting drained lines for assertions
#[derive(Default)]
struct VecSink(Mutex<Vec<(StreamSource, String)>>);

impl VecSink {
    fn lines(&self, source: StreamSource) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl LogSink for VecSink {
    fn log(&self, source: StreamSource, line: &str) {
        self.0.lock().unwrap().push((source, line.to_string()));
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Settings pointing the supervisor at a fake client script and a hook file
/// inside `dir`
fn fake_client_settings(dir: &TempDir, client_body: &str) -> (ConnectionSettings, PathBuf) {
    let client = write_script(dir.path(), "fake-client.sh", client_body);
    let hook = dir.path().join("update-resolv-conf");
    std::fs::write(&hook, "#!/bin/sh\n").unwrap();
    let profile = dir.path().join("relay.ovpn");
    std::fs::write(&profile, "client\n").unwrap();

    let settings = ConnectionSettings {
        client_program: client.to_string_lossy().to_string(),
        hook_candidates: vec![hook],
        ..Default::default()
    };
    (settings, profile)
}

async fn wait_for_lines(sink: &VecSink, source: StreamSource, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if sink.lines(source).len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {} lines on {}", count, source);
}

#[test]
fn test_resolve_hook_picks_first_existing_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("update-resolv-conf");
    let second = dir.path().join("up.sh");
    std::fs::write(&first, "").unwrap();
    std::fs::write(&second, "").unwrap();

    let resolved = supervisor::resolve_hook(&[
        dir.path().join("missing"),
        first.clone(),
        second,
    ])
    .unwrap();
    assert_eq!(resolved, first);
}

#[test]
fn test_resolve_hook_fails_when_no_candidate_exists() {
    let dir = tempfile::tempdir().unwrap();
    let result = supervisor::resolve_hook(&[dir.path().join("missing")]);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_launch_fails_for_missing_client_program() {
    let dir = tempfile::tempdir().unwrap();
    let (mut settings, profile) = fake_client_settings(&dir, "#!/bin/sh\n");
    settings.client_program = "/nonexistent/gatehop-client".to_string();

    let result = supervisor::launch(&profile, &settings, Arc::new(VecSink::default()));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_launch_fails_without_hook() {
    let dir = tempfile::tempdir().unwrap();
    let (mut settings, profile) = fake_client_settings(&dir, "#!/bin/sh\n");
    settings.hook_candidates = vec![dir.path().join("missing-hook")];

    let result = supervisor::launch(&profile, &settings, Arc::new(VecSink::default()));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_drains_preserve_per_stream_order() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, profile) = fake_client_settings(
        &dir,
        "#!/bin/sh\n\
         echo \"line one\"\n\
         echo \"line two\"\n\
         echo \"warn one\" >&2\n\
         echo \"line three\"\n\
         sleep 30\n",
    );

    let sink = Arc::new(VecSink::default());
    let mut process = supervisor::launch(&profile, &settings, Arc::clone(&sink) as Arc<dyn LogSink>).unwrap();
    assert!(process.id().is_some());

    wait_for_lines(&sink, StreamSource::Stdout, 3).await;
    wait_for_lines(&sink, StreamSource::Stderr, 1).await;

    assert_eq!(
        sink.lines(StreamSource::Stdout),
        vec!["line one", "line two", "line three"]
    );
    assert_eq!(sink.lines(StreamSource::Stderr), vec!["warn one"]);

    process.terminate().await.unwrap();
}

#[tokio::test]
async fn test_drains_finish_when_child_exits() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, profile) = fake_client_settings(
        &dir,
        "#!/bin/sh\n\
         echo \"short run\"\n\
         echo \"done\" >&2\n",
    );

    let sink = Arc::new(VecSink::default());
    let mut process = supervisor::launch(&profile, &settings, Arc::clone(&sink) as Arc<dyn LogSink>).unwrap();

    let status = process.wait().await.unwrap();
    assert!(status.success());

    // terminate on an already-exited child just joins the drains
    process.terminate().await.unwrap();

    assert_eq!(sink.lines(StreamSource::Stdout), vec!["short run"]);
    assert_eq!(sink.lines(StreamSource::Stderr), vec!["done"]);
}

#[tokio::test]
async fn test_terminate_kills_a_running_client() {
    let dir = tempfile::tempdir().unwrap();
    let (settings, profile) = fake_client_settings(&dir, "#!/bin/sh\nsleep 30 &\nwait $!\n");

    let sink = Arc::new(VecSink::default());
    let mut process = supervisor::launch(&profile, &settings, Arc::clone(&sink) as Arc<dyn LogSink>).unwrap();

    let start = Instant::now();
    process.terminate().await.unwrap();
    // SIGTERM should do it well before the SIGKILL escalation window
    assert!(start.elapsed() < Duration::from_secs(5));
}
