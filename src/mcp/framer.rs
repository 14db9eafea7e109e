//! Line framing for the stdio transport
//!
//! Each protocol message occupies exactly one `\n`-terminated line of UTF-8
//! JSON. The reader buffers partial reads until a full line is available and
//! skips any line that does not decode into a [`Message`]; the writer emits one
//! message per line under a lock so concurrent writers never interleave.

use futures::stream::{self, Stream};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::mcp::protocol::Message;

/// Reads protocol messages from a byte stream, one per line
pub struct MessageReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    skipped: u64,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::with_capacity(4096),
            skipped: 0,
        }
    }

    /// Read the next well-formed message
    ///
    /// Returns `Ok(None)` once the stream is closed. Malformed lines are
    /// logged and skipped; only I/O errors end the sequence early.
    ///
    /// Cancel safe: bytes of a partially read line stay buffered and the
    /// next call picks up where this one stopped.
    pub async fn next_message(&mut self) -> std::io::Result<Option<Message>> {
        loop {
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 && self.buf.is_empty() {
                return Ok(None);
            }

            let decoded = decode_line(&self.buf);
            self.buf.clear();

            match decoded {
                Line::Blank => continue,
                Line::Message(message) => return Ok(Some(message)),
                Line::Malformed(reason) => {
                    self.skipped += 1;
                    warn!("Skipping malformed line: {}", reason);
                }
            }
        }
    }

    /// Number of lines dropped as malformed so far
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }
}

enum Line {
    Blank,
    Message(Message),
    Malformed(String),
}

fn decode_line(bytes: &[u8]) -> Line {
    let line = match std::str::from_utf8(bytes) {
        Ok(line) => line.trim_end_matches(&['\n', '\r'][..]),
        Err(e) => return Line::Malformed(format!("not UTF-8 ({})", e)),
    };

    if line.trim().is_empty() {
        return Line::Blank;
    }

    match Message::parse(line) {
        Ok(message) => {
            debug!("Received: {}", line);
            Line::Message(message)
        }
        Err(e) => Line::Malformed(format!("{}: {}", e, line)),
    }
}

/// Lazy stream of messages; ends when the underlying stream closes
pub fn messages<R>(reader: R) -> impl Stream<Item = std::io::Result<Message>>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(MessageReader::new(reader)), |state| async move {
        let mut reader = state?;
        match reader.next_message().await {
            Ok(Some(message)) => Some((Ok(message), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Writes protocol messages to a byte stream, one per line
///
/// Shared between tasks behind an `Arc`; the internal lock covers the whole
/// write-and-flush of a single line.
pub struct MessageWriter<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Serialize `message`, append the line terminator, write and flush
    pub async fn write_message(&self, message: &Message) -> std::io::Result<()> {
        let line = message.to_line()?;

        let mut writer = self.writer.lock().await;
        send_line(&mut *writer, &line).await
    }

    /// Build a message while holding the write lock, then send it
    ///
    /// Builders run in the order their messages reach the stream. If the
    /// write fails, the builder's `T` is dropped before the error returns.
    pub async fn write_with<T, E, F>(&self, build: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<(Message, T), E>,
        E: From<std::io::Error>,
    {
        let mut writer = self.writer.lock().await;
        let (message, value) = build()?;
        let line = message.to_line().map_err(std::io::Error::from)?;
        send_line(&mut *writer, &line).await?;
        Ok(value)
    }

    /// Flush and shut down the write side
    pub async fn shutdown(&self) -> std::io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

async fn send_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &[u8]) -> std::io::Result<()> {
    writer.write_all(line).await?;
    writer.flush().await?;

    debug!("Sent: {}", String::from_utf8_lossy(&line[..line.len() - 1]));
    Ok(())
}
