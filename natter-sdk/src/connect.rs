//! TCP connection acquisition with bounded immediate retries.
//!
//! Connect failures are retried immediately a few times, then with a
//! fixed backoff, forever. The acquirer never gives up on its own; the
//! caller's cancellation scope decides when to stop waiting.

use std::time::Duration;

use tokio::net::TcpStream;

/// Connect failures retried back-to-back before backing off.
pub const MAX_IMMEDIATE_ATTEMPTS: u32 = 3;
/// Wait between attempts once the immediate budget is spent.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Open a TCP connection to `host:port`, retrying until it succeeds.
///
/// The stream is owned by the caller's connection scope and closed by
/// drop on every exit path. This function knows nothing about protocol
/// content.
pub async fn acquire(host: &str, port: u16) -> TcpStream {
    let mut failures = 0u32;
    loop {
        match TcpStream::connect((host, port)).await {
            Ok(stream) => {
                tracing::info!(host, port, "connection established");
                return stream;
            }
            Err(e) => {
                failures += 1;
                if failures <= MAX_IMMEDIATE_ATTEMPTS {
                    tracing::warn!(host, port, error = %e, attempt = failures, "connect failed, retrying");
                } else {
                    tracing::warn!(
                        host,
                        port,
                        error = %e,
                        backoff_secs = RETRY_BACKOFF.as_secs(),
                        "connect failed repeatedly, backing off"
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }
}
