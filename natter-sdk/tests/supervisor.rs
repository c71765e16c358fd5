//! Supervisor behavior against scripted chat servers: the happy path,
//! failure classification (retryable vs fatal vs shutdown), and queue
//! fan-out.

mod common;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use common::{BOB_PAYLOAD, Harness, bind, connections, recv_within, serve_handshake, settings};
use natter_sdk::{Account, ChatError, ConnectionState, StatusUpdate};

#[tokio::test]
async fn authenticates_then_streams_and_sends() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let mut read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let mut harness = Harness::start(settings(read_port, write_port), common::quiet_config());

    // Read port: two chat lines, then hold the socket open.
    let read_stream = recv_within(&mut read_conns, "read connection").await;
    let (_read_rx, mut read_tx) = read_stream.into_split();
    read_tx.write_all(b"welcome to chat\nhi all\n").await.unwrap();

    // Write port: full handshake.
    let write_stream = recv_within(&mut write_conns, "write connection").await;
    let (mut server_reader, _server_writer, token) =
        serve_handshake(write_stream, BOB_PAYLOAD).await;
    assert_eq!(token, "abc123");

    // Write(Established) must precede Nickname; both precede anything
    // the writer publishes later.
    let seen = harness
        .status_until("nickname event", |u| matches!(u, StatusUpdate::Nickname(_)))
        .await;
    let established = seen
        .iter()
        .position(|u| *u == StatusUpdate::Write(ConnectionState::Established))
        .expect("write channel never established");
    let nickname = seen.len() - 1;
    assert!(established < nickname);
    assert_eq!(
        seen[nickname],
        StatusUpdate::Nickname(Account {
            nickname: "Bob".into(),
            account_hash: "xyz".into(),
        })
    );

    // Reader fans out to both the display and persistence queues.
    assert_eq!(recv_within(&mut harness.incoming, "incoming line").await, "welcome to chat");
    assert_eq!(recv_within(&mut harness.incoming, "incoming line").await, "hi all");
    assert_eq!(recv_within(&mut harness.persist, "persist line").await, "welcome to chat");
    assert_eq!(recv_within(&mut harness.persist, "persist line").await, "hi all");

    // Outgoing lines arrive as chat submissions: line, then blank line.
    harness.send("hello everyone");
    let mut line = String::new();
    server_reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "hello everyone\n");
    line.clear();
    server_reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "\n");

    assert!(harness.stop().await.is_ok());
}

#[tokio::test]
async fn rejected_token_is_fatal_and_not_retried() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let _read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let harness = Harness::start(settings(read_port, write_port), common::quiet_config());

    // Empty payload is the defined rejection signal.
    let write_stream = recv_within(&mut write_conns, "write connection").await;
    let (_reader, _writer, _token) = serve_handshake(write_stream, "").await;

    let err = harness.join().await.unwrap_err();
    assert!(matches!(err, ChatError::InvalidToken(_)));

    // No reconnect: the write port must not see a second connection.
    let second = tokio::time::timeout(Duration::from_millis(200), write_conns.recv()).await;
    assert!(second.is_err(), "fatal error must not trigger a retry");
}

#[tokio::test]
async fn write_socket_hangup_before_token_reply_triggers_reconnect() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let _read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let mut harness = Harness::start(settings(read_port, write_port), common::quiet_config());

    // First attempt: greeting, then hang up before the account payload.
    let write_stream = recv_within(&mut write_conns, "first write connection").await;
    let (_rx, mut tx) = write_stream.into_split();
    tx.write_all(b"Hello! Enter your token:\n").await.unwrap();
    drop(tx);
    drop(_rx);

    // The supervisor restarts the group; the second attempt completes.
    let write_stream = recv_within(&mut write_conns, "second write connection").await;
    let (_reader, _writer, token) = serve_handshake(write_stream, BOB_PAYLOAD).await;
    assert_eq!(token, "abc123");

    let seen = harness
        .status_until("nickname after reconnect", |u| {
            matches!(u, StatusUpdate::Nickname(_))
        })
        .await;
    assert!(
        seen.contains(&StatusUpdate::Write(ConnectionState::Closed)),
        "first write channel must report closed"
    );

    assert!(harness.stop().await.is_ok());
}

#[tokio::test]
async fn queued_outgoing_lines_survive_a_reconnect() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let _read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let harness = Harness::start(settings(read_port, write_port), common::quiet_config());

    // Queue a line before any connection is fully up, then kill the
    // first write attempt.
    harness.send("typed while offline");
    let write_stream = recv_within(&mut write_conns, "first write connection").await;
    drop(write_stream);

    let write_stream = recv_within(&mut write_conns, "second write connection").await;
    let (mut reader, _writer, _token) = serve_handshake(write_stream, BOB_PAYLOAD).await;

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "typed while offline\n");

    assert!(harness.stop().await.is_ok());
}

#[tokio::test]
async fn external_shutdown_ends_cleanly_mid_connection() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let _read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let harness = Harness::start(settings(read_port, write_port), common::quiet_config());
    let write_stream = recv_within(&mut write_conns, "write connection").await;
    let (_reader, _writer, _token) = serve_handshake(write_stream, BOB_PAYLOAD).await;

    assert!(harness.stop().await.is_ok());
}

#[tokio::test]
async fn closed_input_queue_is_treated_as_shutdown() {
    let (read_listener, read_port) = bind().await;
    let (write_listener, write_port) = bind().await;
    let _read_conns = connections(read_listener);
    let mut write_conns = connections(write_listener);

    let mut harness = Harness::start(settings(read_port, write_port), common::quiet_config());
    let write_stream = recv_within(&mut write_conns, "write connection").await;
    let (_reader, _writer, _token) = serve_handshake(write_stream, BOB_PAYLOAD).await;

    // Wait for authentication, then drop the input side.
    harness
        .status_until("nickname event", |u| matches!(u, StatusUpdate::Nickname(_)))
        .await;
    harness.outgoing.take();

    assert!(harness.join().await.is_ok());
}
