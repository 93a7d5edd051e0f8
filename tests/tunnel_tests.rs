//! End-to-end tests against a fake rocky server on loopback

mod common;

use common::*;
use rocky_client::error::RockyError;
use rocky_client::run_client;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

#[tokio::test]
async fn test_session_handshake_and_relay() {
    let rocky = FakeRocky::start().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(rocky.config()), shutdown_rx));

    let mut control = accept(&rocky.control).await;
    control.write_all(b"New\nabc123\n").await.unwrap();

    let mut target = accept(&rocky.target).await;
    let mut tunnel = accept(&rocky.tunnel).await;

    assert_eq!(read_n(&mut control, 6).await, b"abc123");
    assert_eq!(read_n(&mut tunnel, 6).await, b"abc123");

    tunnel.write_all(b"PING").await.unwrap();
    assert_eq!(read_n(&mut target, 4).await, b"PING");

    target.write_all(b"PONG").await.unwrap();
    assert_eq!(read_n(&mut tunnel, 4).await, b"PONG");

    // Closing the target tears down the tunnel leg as well
    drop(target);
    assert_closed(&mut tunnel).await;

    shutdown_tx.send(true).unwrap();
    let result = tokio::time::timeout(TEST_TIMEOUT, client).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_tunnel_close_closes_target() {
    let rocky = FakeRocky::start().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(rocky.config()), shutdown_rx));

    let mut control = accept(&rocky.control).await;
    control.write_all(b"New\nxyz\n").await.unwrap();

    let mut target = accept(&rocky.target).await;
    let mut tunnel = accept(&rocky.tunnel).await;
    assert_eq!(read_n(&mut tunnel, 3).await, b"xyz");

    drop(tunnel);
    assert_closed(&mut target).await;

    // The control connection is unaffected by the session ending
    control.write_all(b"New\nnext\n").await.unwrap();
    let _target = accept(&rocky.target).await;
    let mut tunnel = accept(&rocky.tunnel).await;
    assert_eq!(read_n(&mut tunnel, 4).await, b"next");

    client.abort();
}

#[tokio::test]
async fn test_target_dial_failure_keeps_control_loop() {
    let rocky = FakeRocky::start().await;
    let config = rocky.config();
    let target_addr = rocky.target.local_addr().unwrap();
    let FakeRocky {
        control: control_listener,
        tunnel: tunnel_listener,
        target,
    } = rocky;
    drop(target);

    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(config), shutdown_rx));

    let mut control = accept(&control_listener).await;
    control.write_all(b"New\nfirst\n").await.unwrap();

    // No tunnel connection is opened for a session whose target is down
    let tunnel = tokio::time::timeout(Duration::from_millis(300), tunnel_listener.accept()).await;
    assert!(tunnel.is_err());

    // Bring the target up; the next directive is still processed
    let target_listener = TcpListener::bind(target_addr).await.unwrap();
    control.write_all(b"New\nsecond\n").await.unwrap();
    let _target = accept(&target_listener).await;
    let mut tunnel = accept(&tunnel_listener).await;

    // `first` was never echoed on the control connection
    assert_eq!(read_n(&mut control, 6).await, b"second");
    assert_eq!(read_n(&mut tunnel, 6).await, b"second");

    client.abort();
}

#[tokio::test]
async fn test_server_eof_stops_client() {
    let rocky = FakeRocky::start().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(rocky.config()), shutdown_rx));

    let control = accept(&rocky.control).await;
    drop(control);

    let result = tokio::time::timeout(TEST_TIMEOUT, client).await.unwrap().unwrap();
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RockyError>(),
        Some(RockyError::ServerClosed)
    ));

    // No reconnect attempt follows
    let again = tokio::time::timeout(Duration::from_millis(300), rocky.control.accept()).await;
    assert!(again.is_err());
}

#[tokio::test]
async fn test_truncated_directive_reconnects() {
    let rocky = FakeRocky::start().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(rocky.config()), shutdown_rx));

    let mut control = accept(&rocky.control).await;
    control.write_all(b"New\n").await.unwrap();
    drop(control);

    // The client comes back on a fresh control connection without opening a session
    let mut control = accept(&rocky.control).await;
    let tunnel = tokio::time::timeout(Duration::from_millis(200), rocky.tunnel.accept()).await;
    assert!(tunnel.is_err());

    control.write_all(b"New\nretry\n").await.unwrap();
    let _target = accept(&rocky.target).await;
    let mut tunnel = accept(&rocky.tunnel).await;
    assert_eq!(read_n(&mut tunnel, 5).await, b"retry");

    client.abort();
}

#[tokio::test]
async fn test_handshake_newline_option() {
    let rocky = FakeRocky::start().await;
    let mut config = rocky.config();
    config.handshake_newline = true;

    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(config), shutdown_rx));

    let mut control = accept(&rocky.control).await;
    control.write_all(b"New\nabc123\n").await.unwrap();

    let _target = accept(&rocky.target).await;
    let mut tunnel = accept(&rocky.tunnel).await;
    assert_eq!(read_n(&mut control, 7).await, b"abc123\n");
    assert_eq!(read_n(&mut tunnel, 7).await, b"abc123\n");

    client.abort();
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let rocky = FakeRocky::start().await;
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let client = tokio::spawn(run_client(root(rocky.config()), shutdown_rx));

    // Echo server standing in for the local target
    let target_listener = rocky.target;
    tokio::spawn(async move {
        loop {
            let (mut conn, _) = target_listener.accept().await.unwrap();
            tokio::spawn(async move {
                let (mut r, mut w) = conn.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });

    let mut control = accept(&rocky.control).await;
    control.write_all(b"New\naaaa\nNew\nbbbb\n").await.unwrap();

    let mut first = accept(&rocky.tunnel).await;
    let mut second = accept(&rocky.tunnel).await;

    // Establishment may finish in any order; the id tells the tunnels apart
    let first_id = read_n(&mut first, 4).await;
    let second_id = read_n(&mut second, 4).await;
    let mut ids = vec![first_id.clone(), second_id.clone()];
    ids.sort();
    assert_eq!(ids, vec![b"aaaa".to_vec(), b"bbbb".to_vec()]);

    first.write_all(b"payload-one").await.unwrap();
    second.write_all(b"payload-two").await.unwrap();
    assert_eq!(read_n(&mut first, 11).await, b"payload-one");
    assert_eq!(read_n(&mut second, 11).await, b"payload-two");

    // Ending one session leaves the other running
    drop(first);
    second.write_all(b"still-here").await.unwrap();
    assert_eq!(read_n(&mut second, 10).await, b"still-here");

    let mut echoed = [0u8; 8];
    tokio::time::timeout(TEST_TIMEOUT, control.read_exact(&mut echoed))
        .await
        .unwrap()
        .unwrap();
    let echoed = String::from_utf8_lossy(&echoed).to_string();
    assert!(echoed == "aaaabbbb" || echoed == "bbbbaaaa");

    client.abort();
}
