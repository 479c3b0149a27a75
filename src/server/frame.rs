//! Line framing
//!
//! Messages travel as UTF-8 JSON objects, one per line. A trailing `\r`
//! before the newline is tolerated, blank lines are skipped.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{FrameError, Result};

/// Default upper bound on a single frame (64KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Incremental newline-delimited frame decoder
#[derive(Debug)]
pub struct LineDecoder {
    buf: BytesMut,
    max_len: usize,
}

impl LineDecoder {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_len.min(8 * 1024)),
            max_len,
        }
    }

    /// Buffer to read socket data into
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Append raw bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet decoded
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Decode the next complete frame
    ///
    /// Returns `Ok(None)` when more data is needed.
    pub fn decode(&mut self) -> std::result::Result<Option<String>, FrameError> {
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.buf.len() > self.max_len {
                    return Err(FrameError::TooLarge {
                        len: self.buf.len(),
                        max: self.max_len,
                    });
                }
                return Ok(None);
            };

            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }

            if line.len() > self.max_len {
                return Err(FrameError::TooLarge {
                    len: line.len(),
                    max: self.max_len,
                });
            }

            let text = String::from_utf8(line.to_vec()).map_err(|_| FrameError::InvalidUtf8)?;
            if text.trim().is_empty() {
                continue;
            }
            return Ok(Some(text));
        }
    }
}

/// Reads frames from an async byte stream
pub struct FrameReader<R> {
    reader: R,
    decoder: LineDecoder,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_frame_size: usize) -> Self {
        Self {
            reader,
            decoder: LineDecoder::new(max_frame_size),
        }
    }

    /// Next frame, or `None` once the peer has closed the stream
    ///
    /// Cancel safe: a partially read frame stays buffered.
    pub async fn next_frame(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.decoder.decode()? {
                return Ok(Some(line));
            }

            if self.reader.read_buf(self.decoder.buffer_mut()).await? == 0 {
                if self.decoder.buffered() > 0 {
                    tracing::trace!(bytes = self.decoder.buffered(), "Discarding unterminated frame");
                }
                return Ok(None);
            }
        }
    }
}

/// Serialize a message as one JSON line
pub fn encode_line<T: Serialize>(message: &T) -> std::result::Result<Bytes, serde_json::Error> {
    let mut writer = BytesMut::with_capacity(256).writer();
    serde_json::to_writer(&mut writer, message)?;

    let mut buf = writer.into_inner();
    buf.put_u8(b'\n');
    Ok(buf.freeze())
}
