//! Shared harness for the integration tests: a running client wired to
//! scripted TCP chat servers on loopback ports.
#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use natter_sdk::client::{self, Outbound, ReconnectConfig};
use natter_sdk::{ChatError, Settings, StatusUpdate};

pub const BOB_PAYLOAD: &str = r#"{"nickname":"Bob","account_hash":"xyz"}"#;

pub fn settings(read_port: u16, write_port: u16) -> Settings {
    Settings {
        host: "127.0.0.1".to_string(),
        read_port,
        write_port,
        display_name: "Anonymous".to_string(),
        token: "abc123".to_string(),
    }
}

/// Timing for tests that exercise the protocol, not the timers: pings
/// and the watchdog stay out of the way, reconnects are fast.
pub fn quiet_config() -> ReconnectConfig {
    ReconnectConfig {
        reconnect_delay: Duration::from_millis(50),
        ping_interval: Duration::from_secs(60),
        ping_timeout: Duration::from_secs(5),
        watchdog_timeout: Duration::from_secs(120),
    }
}

pub async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Accept connections forever, handing each to the test in order.
pub fn connections(listener: TcpListener) -> mpsc::UnboundedReceiver<TcpStream> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if tx.send(stream).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the write-port handshake: greeting out, token in, payload out.
/// Returns the channel halves and the token the client sent.
pub async fn serve_handshake(
    stream: TcpStream,
    payload: &str,
) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf, String) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half
        .write_all(b"Hello! Enter your token:\n")
        .await
        .unwrap();
    let mut token = String::new();
    reader.read_line(&mut token).await.unwrap();
    write_half
        .write_all(format!("{payload}\n").as_bytes())
        .await
        .unwrap();

    (reader, write_half, token.trim_end().to_string())
}

pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>, what: &str) -> T {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .unwrap_or_else(|| panic!("channel closed while waiting for {what}"))
}

pub struct Harness {
    pub incoming: mpsc::UnboundedReceiver<String>,
    pub persist: mpsc::UnboundedReceiver<String>,
    pub status: mpsc::UnboundedReceiver<StatusUpdate>,
    /// `Option` so tests can drop the input side to simulate the host
    /// application going away.
    pub outgoing: Option<mpsc::UnboundedSender<String>>,
    pub shutdown: watch::Sender<bool>,
    pub client: JoinHandle<Result<(), ChatError>>,
}

impl Harness {
    pub fn start(settings: Settings, config: ReconnectConfig) -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let outbound = Outbound {
            incoming: incoming_tx,
            persist: persist_tx,
            status: status_tx,
        };
        let client = tokio::spawn(client::run(
            settings,
            config,
            outbound,
            outgoing_rx,
            shutdown_rx,
        ));

        Self {
            incoming: incoming_rx,
            persist: persist_rx,
            status: status_rx,
            outgoing: Some(outgoing_tx),
            shutdown: shutdown_tx,
            client,
        }
    }

    pub fn send(&self, line: &str) {
        self.outgoing
            .as_ref()
            .expect("outgoing sender already dropped")
            .send(line.to_string())
            .unwrap();
    }

    /// Wait for the client to finish on its own.
    pub async fn join(self) -> Result<(), ChatError> {
        tokio::time::timeout(Duration::from_secs(5), self.client)
            .await
            .expect("client did not finish")
            .expect("client task panicked")
    }

    /// Signal external shutdown and wait for a clean exit.
    pub async fn stop(self) -> Result<(), ChatError> {
        self.shutdown.send_replace(true);
        tokio::time::timeout(Duration::from_secs(5), self.client)
            .await
            .expect("client did not stop after shutdown")
            .expect("client task panicked")
    }

    /// Collect status updates until `pred` matches, returning everything
    /// seen up to and including the match.
    pub async fn status_until(
        &mut self,
        what: &str,
        pred: impl Fn(&StatusUpdate) -> bool,
    ) -> Vec<StatusUpdate> {
        let mut seen = Vec::new();
        loop {
            let update = recv_within(&mut self.status, what).await;
            let done = pred(&update);
            seen.push(update);
            if done {
                return seen;
            }
        }
    }
}
