//! Integration tests for control channel polling against a mock management
//! interface

use gatehop_core::config::ControlEndpoint;
use gatehop_core::vpn::ControlPoller;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawn a mock management interface that answers every connection with a
/// fixed reply after consuming the status query
async fn spawn_control_server(reply: &'static str) -> ControlEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 64];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(reply.as_bytes()).await;
            });
        }
    });

    ControlEndpoint::new("127.0.0.1", port)
}

/// Spawn a mock server that accepts connections but never replies
async fn spawn_silent_server() -> ControlEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            // Consume the query, then go quiet with the connection open
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            held.push(socket);
        }
    });

    ControlEndpoint::new("127.0.0.1", port)
}

fn poller(endpoint: ControlEndpoint, timeout: Duration, settle: Duration) -> ControlPoller {
    ControlPoller::new(endpoint, timeout, Duration::from_millis(200), settle)
}

#[tokio::test]
async fn test_connected_marker_is_detected() {
    let endpoint =
        spawn_control_server(">STATE:1700000000,CONNECTED,SUCCESS,10.8.0.2,1.2.3.4\r\nEND\r\n")
            .await;

    let poller = poller(endpoint, Duration::from_secs(5), Duration::ZERO);
    assert!(poller.wait_for_connected().await);
}

#[tokio::test]
async fn test_marker_position_does_not_matter() {
    let endpoint = spawn_control_server(
        "NOTE: management interface\r\npreamble CONNECTED,SUCCESS trailer\r\n",
    )
    .await;

    let poller = poller(endpoint, Duration::from_secs(5), Duration::ZERO);
    assert!(poller.wait_for_connected().await);
}

#[tokio::test]
async fn test_settle_delay_is_applied_after_marker() {
    let endpoint =
        spawn_control_server(">STATE:1700000000,CONNECTED,SUCCESS,10.8.0.2,1.2.3.4\r\n").await;

    let settle = Duration::from_millis(300);
    let poller = poller(endpoint, Duration::from_secs(5), settle);

    let start = Instant::now();
    assert!(poller.wait_for_connected().await);
    assert!(start.elapsed() >= settle);
}

#[tokio::test]
async fn test_reply_without_marker_times_out() {
    let endpoint = spawn_control_server(">STATE:1700000000,RECONNECTING,init,,\r\nEND\r\n").await;

    let timeout = Duration::from_secs(1);
    let poller = poller(endpoint, timeout, Duration::ZERO);

    let start = Instant::now();
    assert!(!poller.wait_for_connected().await);
    assert!(start.elapsed() >= timeout);
}

#[tokio::test]
async fn test_connection_refused_times_out() {
    // Bind and drop to get a port nothing is listening on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let timeout = Duration::from_secs(1);
    let poller = poller(
        ControlEndpoint::new("127.0.0.1", port),
        timeout,
        Duration::ZERO,
    );

    let start = Instant::now();
    assert!(!poller.wait_for_connected().await);
    assert!(start.elapsed() >= timeout);
}

#[tokio::test]
async fn test_silent_server_is_treated_as_not_connected() {
    let endpoint = spawn_silent_server().await;

    let timeout = Duration::from_secs(1);
    let poller = poller(endpoint, timeout, Duration::ZERO);

    let start = Instant::now();
    assert!(!poller.wait_for_connected().await);
    assert!(start.elapsed() >= timeout);
}
