//! Token handshake on the write channel.
//!
//! Wire order: server greeting in, token out, account payload in. The
//! payload is either a JSON object describing the account or junk/empty
//! on rejection. A payload that fails to parse is *not* an error here:
//! it is the defined signal for an unknown token, and the writer loop
//! decides what that means.

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::codec;
use crate::error::ChatError;
use crate::event::Account;

/// Exchange `token` for an account record. `Ok(None)` means the server
/// rejected the token. I/O failure anywhere is a connection error.
pub async fn authorize<R, W>(
    reader: &mut R,
    writer: &mut W,
    token: &str,
) -> Result<Option<Account>, ChatError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let greeting = codec::read_line(reader).await?;
    tracing::debug!(%greeting, "server greeting");

    codec::write_line(writer, token).await?;

    let payload = codec::read_line(reader).await?;
    Ok(serde_json::from_str(&payload).ok())
}
