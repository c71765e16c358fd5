//! Line-frame codec for the wire protocol.
//!
//! Every frame is newline-terminated UTF-8. Control and keep-alive lines
//! end in a single `\n`; a user chat submission ends in `\n\n` so the
//! server can tell a complete submission from protocol traffic.
//!
//! Policy: a read that yields zero bytes (EOF) is a connection error,
//! the peer closed the stream. A blank *line* (`"\n"`) is a valid empty
//! keep-alive frame and decodes to the empty string.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ChatError;

/// Read one line frame and return its text with trailing whitespace
/// stripped. Invalid UTF-8 surfaces as an `InvalidData` I/O error.
pub async fn read_line<R>(reader: &mut R) -> Result<String, ChatError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Err(ChatError::Connection(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed the stream",
        )));
    }
    buf.truncate(buf.trim_end().len());
    tracing::trace!(line = %buf, "received");
    Ok(buf)
}

/// Write one control line: `text` + `\n`, flushed. Empty text produces a
/// lone newline, the keep-alive/ping frame.
pub async fn write_line<W>(writer: &mut W, text: &str) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Write one chat submission: `text` + `\n\n`, flushed.
pub async fn write_chat<W>(writer: &mut W, text: &str) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n\n").await?;
    writer.flush().await?;
    Ok(())
}
