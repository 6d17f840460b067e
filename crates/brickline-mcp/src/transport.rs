//! Stdio message framing.
//!
//! Two framings are accepted on input:
//!
//! ```text
//! {"jsonrpc": "2.0", "id": 1, "method": "..."}\n          (newline-delimited)
//!
//! Content-Length: <length>\r\n                              (header framed)
//! \r\n
//! {"jsonrpc": "2.0", "id": 1, "method": "..."}
//! ```
//!
//! Each response is written back in the framing its request arrived in.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{McpError, Result};

/// Largest body accepted behind a `Content-Length` header.
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// How a message was framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON document per line.
    Line,
    /// `Content-Length` header block followed by the body.
    ContentLength,
}

/// A raw inbound message and its framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message body (unparsed JSON).
    pub body: String,
    /// Framing the body arrived in.
    pub framing: Framing,
}

/// Reads framed messages from an async byte stream.
///
/// Bodies are never logged; only their size and framing are traced.
pub struct MessageReader<R> {
    reader: R,
    buf: Vec<u8>,
    framing: Framing,
}

impl<R: AsyncBufRead + Unpin> MessageReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            framing: Framing::Line,
        }
    }

    /// Framing of the message most recently started, including one that
    /// failed to read. Used to answer an unreadable message in kind.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Read the next message. Returns `None` at end of stream.
    ///
    /// Blank lines between messages are skipped. A message that is not valid
    /// UTF-8 or has a bad header is a [`McpError::Protocol`]; the offending
    /// input has been consumed, so reading can continue.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            self.framing = Framing::Line;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }

            if let Some(length) = content_length(&line)? {
                self.framing = Framing::ContentLength;
                let body = self.read_framed_body(length).await?;
                return Ok(Some(Frame {
                    body,
                    framing: Framing::ContentLength,
                }));
            }

            tracing::trace!(bytes = line.len(), "received line message");
            return Ok(Some(Frame {
                body: line,
                framing: Framing::Line,
            }));
        }
    }

    /// Read one line, trimmed. `None` at end of stream.
    async fn read_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        let line = std::str::from_utf8(&self.buf)
            .map_err(|e| McpError::protocol(format!("invalid UTF-8 in message: {}", e)))?;
        Ok(Some(line.trim().to_string()))
    }

    /// Skip remaining headers up to the blank line, then read the body.
    async fn read_framed_body(&mut self, length: usize) -> Result<String> {
        loop {
            match self.read_line().await? {
                None => return Err(McpError::protocol("stream ended inside header block")),
                Some(line) if line.is_empty() => break,
                Some(_) => {}
            }
        }

        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).await?;

        let json_str = String::from_utf8(body)
            .map_err(|e| McpError::protocol(format!("invalid UTF-8 in message: {}", e)))?;
        tracing::trace!(content_length = length, "received framed message");
        Ok(json_str)
    }
}

/// Parse a `Content-Length` header line, if that is what `line` is.
fn content_length(line: &str) -> Result<Option<usize>> {
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }

    let length: usize = value
        .trim()
        .parse()
        .map_err(|e| McpError::protocol(format!("invalid Content-Length: {}", e)))?;
    if length > MAX_CONTENT_LENGTH {
        return Err(McpError::protocol(format!(
            "Content-Length {} exceeds limit of {} bytes",
            length, MAX_CONTENT_LENGTH
        )));
    }
    Ok(Some(length))
}

/// Write one message in the given framing and flush.
pub async fn write_frame<W>(writer: &mut W, body: &str, framing: Framing) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match framing {
        Framing::Line => {
            writer.write_all(body.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(body.as_bytes()).await?;
        }
    }
    writer.flush().await?;
    tracing::trace!(?framing, bytes = body.len(), "sent message");
    Ok(())
}
