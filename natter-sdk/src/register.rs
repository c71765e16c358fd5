//! Account registration on the write channel.
//!
//! Wire order: server greeting in, empty line out (we have no token),
//! nickname prompt in, preferred name out, account payload in. The
//! returned `account_hash` becomes the caller's token.

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::codec;
use crate::error::ChatError;
use crate::event::Account;

/// Register a new account under `name`. `Ok(None)` means the server
/// answered with something other than an account payload, a
/// registration failure the caller reports to the operator.
pub async fn register<R, W>(
    reader: &mut R,
    writer: &mut W,
    name: &str,
) -> Result<Option<Account>, ChatError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let greeting = codec::read_line(reader).await?;
    tracing::debug!(%greeting, "server greeting");

    codec::write_line(writer, "").await?;

    let prompt = codec::read_line(reader).await?;
    tracing::debug!(%prompt, "nickname prompt");

    codec::write_line(writer, name).await?;

    let payload = codec::read_line(reader).await?;
    Ok(serde_json::from_str(&payload).ok())
}
