//! Resilient client core for the natter line-protocol chat.
//!
//! The SDK owns the connection-resilience and protocol-coordination
//! layer: bounded-retry connection acquisition, line-frame codec, the
//! token handshake, four cooperating I/O loops, and the reconnect
//! supervisor. Presentation, persistence and configuration live in the
//! consuming binary and talk to the core only through queues.
//!
//! ```rust,no_run
//! use natter_sdk::client::{self, Outbound, ReconnectConfig};
//! use natter_sdk::settings::Settings;
//! use tokio::sync::{mpsc, watch};
//!
//! # async fn example() -> Result<(), natter_sdk::ChatError> {
//! let (incoming_tx, _incoming_rx) = mpsc::unbounded_channel();
//! let (persist_tx, _persist_rx) = mpsc::unbounded_channel();
//! let (status_tx, _status_rx) = mpsc::unbounded_channel();
//! let (_outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//! let settings = Settings {
//!     host: "chat.example.net".into(),
//!     read_port: 5000,
//!     write_port: 5050,
//!     display_name: "Anonymous".into(),
//!     token: "abc123".into(),
//! };
//! let outbound = Outbound {
//!     incoming: incoming_tx,
//!     persist: persist_tx,
//!     status: status_tx,
//! };
//! client::run(settings, ReconnectConfig::default(), outbound, outgoing_rx, shutdown_rx).await
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod connect;
pub mod error;
pub mod event;
pub mod register;
pub mod settings;

pub use error::ChatError;
pub use event::{Account, ConnectionState, Pulse, StatusUpdate};
pub use settings::Settings;
