//! The four cooperating I/O loops and the reconnect supervisor.
//!
//! One connection scope runs a reader loop, a writer loop, a ping loop
//! and a watchdog concurrently via `try_join!`; the first loop to fail
//! resolves the join, and dropping the scope's future cancels the
//! siblings mid-await. The supervisor classifies the failure and either
//! restarts the whole scope from scratch (new sockets, new handshake)
//! or terminates.
//!
//! The loops communicate with the outside world only through the
//! process-lifetime queues wired up by the binary; queued-but-unsent
//! output survives a reconnect cycle.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::time;

use crate::auth;
use crate::codec;
use crate::connect;
use crate::error::ChatError;
use crate::event::{ConnectionState, Pulse, StatusUpdate};
use crate::settings::Settings;

/// Timing knobs for one client. The watchdog window must exceed the
/// ping interval so at least one ping fits inside each window.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Fixed wait before restarting the loop group after a retryable
    /// failure.
    pub reconnect_delay: Duration,
    /// How often the ping loop proves the write link.
    pub ping_interval: Duration,
    /// Bounded wait for the ping echo.
    pub ping_timeout: Duration,
    /// A full window with zero pulses is treated as a dead connection.
    pub watchdog_timeout: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(10),
            watchdog_timeout: Duration::from_secs(60),
        }
    }
}

/// Sender side of the process-lifetime queues the loops publish into.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Chat lines for the display.
    pub incoming: mpsc::UnboundedSender<String>,
    /// Chat lines for the persistence collaborator.
    pub persist: mpsc::UnboundedSender<String>,
    /// Connection-state and identity events for the display.
    pub status: mpsc::UnboundedSender<StatusUpdate>,
}

impl Outbound {
    /// Status consumers may be gone during teardown; that is not a
    /// failure of the publishing loop.
    fn publish(&self, update: StatusUpdate) {
        let _ = self.status.send(update);
    }
}

/// Publishes `Closed` for one channel on every exit path, including
/// cancellation by a sibling's failure.
struct ClosedGuard<'a> {
    outbound: &'a Outbound,
    wrap: fn(ConnectionState) -> StatusUpdate,
}

impl Drop for ClosedGuard<'_> {
    fn drop(&mut self) {
        self.outbound.publish((self.wrap)(ConnectionState::Closed));
    }
}

/// Run the client until shutdown or a fatal error.
///
/// Retryable connection failures tear the loop group down, wait
/// `reconnect_delay`, and start over. `Ok(())` means clean shutdown:
/// either the `shutdown` watch flipped to `true` (or its sender
/// dropped), or the `outgoing` queue closed because the input side
/// went away.
pub async fn run(
    settings: Settings,
    config: ReconnectConfig,
    outbound: Outbound,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ChatError> {
    let (pulse_tx, mut pulse_rx) = mpsc::unbounded_channel();

    loop {
        tracing::info!(host = %settings.host, "connecting");
        let outcome = tokio::select! {
            biased;
            _ = wait_shutdown(&mut shutdown) => Err(ChatError::Shutdown),
            r = run_connection(&settings, &config, &outbound, &mut outgoing, &pulse_tx, &mut pulse_rx) => r,
        };

        match outcome {
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    error = %e,
                    delay_secs = config.reconnect_delay.as_secs(),
                    "connection lost, will reconnect"
                );
            }
            Err(ChatError::Shutdown) => {
                tracing::info!("shutting down");
                return Ok(());
            }
            Err(fatal) => {
                tracing::error!(error = %fatal, "fatal error, not retrying");
                return Err(fatal);
            }
            Ok(()) => return Ok(()),
        }

        // Pulses from the torn-down scope must not feed the next
        // watchdog window.
        while pulse_rx.try_recv().is_ok() {}

        tokio::select! {
            biased;
            _ = wait_shutdown(&mut shutdown) => {
                tracing::info!("shutting down");
                return Ok(());
            }
            _ = time::sleep(config.reconnect_delay) => {}
        }
    }
}

async fn wait_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        // Sender dropped means the host application is gone.
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// One connection scope: all four loops, structured fan-in. The first
/// error resolves the join and drops the siblings.
async fn run_connection(
    settings: &Settings,
    config: &ReconnectConfig,
    outbound: &Outbound,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    pulse_tx: &mpsc::UnboundedSender<Pulse>,
    pulse_rx: &mut mpsc::UnboundedReceiver<Pulse>,
) -> Result<(), ChatError> {
    let (ping_tx, ping_rx) = oneshot::channel();
    tokio::try_join!(
        read_loop(settings, outbound, pulse_tx),
        write_loop(settings, outbound, outgoing, pulse_tx, ping_tx),
        ping_loop(config, pulse_tx, ping_rx),
        watchdog_loop(config, pulse_rx),
    )?;
    Ok(())
}

/// Streams server lines into the display and persistence queues.
async fn read_loop(
    settings: &Settings,
    outbound: &Outbound,
    pulses: &mpsc::UnboundedSender<Pulse>,
) -> Result<(), ChatError> {
    outbound.publish(StatusUpdate::Read(ConnectionState::Initiated));
    let _closed = ClosedGuard {
        outbound,
        wrap: StatusUpdate::Read,
    };

    let stream = connect::acquire(&settings.host, settings.read_port).await;
    outbound.publish(StatusUpdate::Read(ConnectionState::Established));

    let mut reader = BufReader::new(stream);
    loop {
        let line = codec::read_line(&mut reader).await?;
        let _ = outbound.incoming.send(line.clone());
        let _ = outbound.persist.send(line);
        let _ = pulses.send(Pulse::MessageReceived);
    }
}

/// Authenticated channel pair handed from the writer loop to the ping
/// loop. The write half stays shared so chat submissions and pings
/// interleave on one socket.
struct PingChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

/// Authenticates, then forwards user lines as chat submissions.
async fn write_loop(
    settings: &Settings,
    outbound: &Outbound,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    pulses: &mpsc::UnboundedSender<Pulse>,
    ping_tx: oneshot::Sender<PingChannel>,
) -> Result<(), ChatError> {
    outbound.publish(StatusUpdate::Write(ConnectionState::Initiated));
    let _closed = ClosedGuard {
        outbound,
        wrap: StatusUpdate::Write,
    };

    let stream = connect::acquire(&settings.host, settings.write_port).await;
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let writer = Arc::new(Mutex::new(write_half));

    let account = {
        let mut w = writer.lock().await;
        auth::authorize(&mut reader, &mut *w, &settings.token).await?
    };
    let Some(account) = account else {
        let _ = pulses.send(Pulse::AuthFailed);
        return Err(ChatError::InvalidToken(
            "server rejected the token".to_string(),
        ));
    };

    outbound.publish(StatusUpdate::Write(ConnectionState::Established));
    outbound.publish(StatusUpdate::Nickname(account.clone()));
    let _ = pulses.send(Pulse::AuthSuccess);
    tracing::info!(nickname = %account.nickname, "authorized");

    let _ = ping_tx.send(PingChannel {
        reader,
        writer: writer.clone(),
    });

    loop {
        // Sole idle suspension point: wait for the next user line.
        let Some(line) = outgoing.recv().await else {
            // Input side gone, the host application closed.
            return Err(ChatError::Shutdown);
        };
        {
            let mut w = writer.lock().await;
            codec::write_chat(&mut *w, &line).await?;
        }
        let _ = pulses.send(Pulse::MessageSent);
        tracing::debug!(%line, "sent");
    }
}

/// Proves the write link with periodic empty-line pings. An idle writer
/// socket can go silently stale with nothing else to detect it.
async fn ping_loop(
    config: &ReconnectConfig,
    pulses: &mpsc::UnboundedSender<Pulse>,
    ping_rx: oneshot::Receiver<PingChannel>,
) -> Result<(), ChatError> {
    let mut channel = match ping_rx.await {
        Ok(channel) => channel,
        // Writer loop died before the handshake finished; its error
        // resolves the join, so just park.
        Err(_) => return std::future::pending().await,
    };

    let mut ticker = time::interval(config.ping_interval);
    ticker.tick().await; // first tick resolves immediately
    loop {
        ticker.tick().await;
        let echo = time::timeout(config.ping_timeout, async {
            {
                let mut w = channel.writer.lock().await;
                codec::write_line(&mut *w, "").await?;
            }
            codec::read_line(&mut channel.reader).await
        })
        .await;
        match echo {
            Ok(Ok(_)) => {
                let _ = pulses.send(Pulse::Pinged);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ChatError::PingTimeout(config.ping_timeout)),
        }
    }
}

/// Primary liveness detector: any pulse resets the timer; a whole
/// window of silence across every loop means the server vanished even
/// though no individual socket reported failure.
async fn watchdog_loop(
    config: &ReconnectConfig,
    pulses: &mut mpsc::UnboundedReceiver<Pulse>,
) -> Result<(), ChatError> {
    loop {
        match time::timeout(config.watchdog_timeout, pulses.recv()).await {
            Ok(Some(pulse)) => {
                tracing::debug!(tag = pulse.label(), "watchdog pulse");
            }
            Ok(None) => {
                return Err(ChatError::Connection(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "pulse channel closed",
                )));
            }
            Err(_) => return Err(ChatError::WatchdogTimeout(config.watchdog_timeout)),
        }
    }
}
