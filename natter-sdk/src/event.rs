//! Events the core publishes for the display layer to consume.

use serde::Deserialize;

/// Account record returned by the server after a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub nickname: String,
    pub account_hash: String,
}

/// Lifecycle of one directional channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Initiated,
    Established,
    Closed,
}

/// One-way status events pushed to the display. The core never reads
/// these back.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// Read-channel state change.
    Read(ConnectionState),
    /// Write-channel state change.
    Write(ConnectionState),
    /// Authenticated identity, published once per successful handshake.
    Nickname(Account),
}

/// Liveness pulse emitted by a loop on successful I/O. Consumed only by
/// the watchdog to reset its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    MessageReceived,
    MessageSent,
    AuthSuccess,
    AuthFailed,
    Pinged,
}

impl Pulse {
    pub fn label(&self) -> &'static str {
        match self {
            Pulse::MessageReceived => "message received",
            Pulse::MessageSent => "message sent",
            Pulse::AuthSuccess => "auth success",
            Pulse::AuthFailed => "auth failed",
            Pulse::Pinged => "pinged",
        }
    }
}
