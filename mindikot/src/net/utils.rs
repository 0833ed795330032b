//! Newline-delimited JSON framing, blocking and async.
//!
//! Every message is a single line of JSON terminated by `\n`. Lines longer
//! than [`MAX_LINE_LENGTH`] are rejected on both ends without buffering
//! the rest of them.

use serde::{Serialize, de::DeserializeOwned};
use std::io::{self, BufRead, Read, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{ProtocolError, Result};

/// Maximum encoded message size, newline excluded.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Serializes `value` into a single newline-terminated line.
pub fn encode_line<T: Serialize>(value: &T) -> Result<String> {
    let mut line = serde_json::to_string(value)?;
    if line.len() > MAX_LINE_LENGTH {
        return Err(ProtocolError::LineTooLong {
            max: MAX_LINE_LENGTH,
        });
    }
    line.push('\n');
    Ok(line)
}

pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Both `read_line` flavours report undecodable bytes as `InvalidData`.
fn read_error(error: io::Error) -> ProtocolError {
    if error.kind() == io::ErrorKind::InvalidData {
        ProtocolError::InvalidUtf8
    } else {
        ProtocolError::Io(error)
    }
}

/// Checks a line read through a `MAX_LINE_LENGTH + 1` limit. Returns
/// `Ok(None)` for a blank line.
fn checked(buf: &str, read: usize) -> Result<Option<&str>> {
    if read == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    let line = buf.strip_suffix('\n').unwrap_or(buf);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.len() > MAX_LINE_LENGTH {
        return Err(ProtocolError::LineTooLong {
            max: MAX_LINE_LENGTH,
        });
    }
    if line.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Reads the next message, skipping blank lines.
pub fn read_line<T: DeserializeOwned, R: BufRead>(reader: &mut R) -> Result<T> {
    let limit = (MAX_LINE_LENGTH + 1) as u64;
    loop {
        let mut buf = String::new();
        let read = reader
            .by_ref()
            .take(limit)
            .read_line(&mut buf)
            .map_err(read_error)?;
        if let Some(line) = checked(&buf, read)? {
            return decode_line(line);
        }
    }
}

pub fn write_line<T: Serialize, W: Write>(writer: &mut W, value: &T) -> Result<()> {
    let line = encode_line(value)?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Async counterpart of [`read_line`].
pub async fn read_line_async<T, R>(reader: &mut R) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncBufRead + Unpin,
{
    let limit = (MAX_LINE_LENGTH + 1) as u64;
    loop {
        let mut buf = String::new();
        let read = (&mut *reader)
            .take(limit)
            .read_line(&mut buf)
            .await
            .map_err(read_error)?;
        if let Some(line) = checked(&buf, read)? {
            return decode_line(line);
        }
    }
}

/// Async counterpart of [`write_line`]. The whole line goes out in one
/// write so concurrent readers never see half a message.
pub async fn write_line_async<T, W>(writer: &mut W, value: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let line = encode_line(value)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
