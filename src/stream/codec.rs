//! Message framing for streaming response bodies.
//!
//! Two framings are supported:
//! - [`Framing::Lines`]: one JSON value per line (`\n` or `\r\n`)
//! - [`Framing::Length`]: a decimal byte count on its own line, followed by
//!   exactly that many bytes
//!
//! Blank keep-alive lines are skipped in both modes.

use std::io;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::Decoder;

/// Largest single message accepted (1 MiB).
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Longest acceptable length-prefix line, including whitespace.
const MAX_LENGTH_LINE: usize = 32;

/// How messages are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Newline-delimited.
    Lines,
    /// Length-prefixed (`delimited=length`).
    Length,
}

/// Unrecoverable framing failures. These close the connection.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A message exceeded [`MAX_FRAME_BYTES`].
    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Observed or announced length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// A length prefix was not a decimal number.
    #[error("Invalid length prefix: {line:?}")]
    InvalidLength {
        /// The offending line, lossily decoded.
        line: String,
    },

    /// The body ended in the middle of a length-prefixed message.
    #[error("Stream ended inside a {expected} byte frame ({received} received)")]
    Truncated {
        /// Announced length.
        expected: usize,
        /// Bytes received before the end.
        received: usize,
    },

    /// I/O failure surfaced through the codec.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// [`Decoder`] that yields one trimmed message per frame.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    framing: Framing,
    max_frame: usize,
    pending_len: Option<usize>,
    scanned: usize,
}

impl MessageCodec {
    /// Create a codec with the default frame limit.
    #[must_use]
    pub const fn new(framing: Framing) -> Self {
        Self::with_max_frame(framing, MAX_FRAME_BYTES)
    }

    /// Create a codec with a custom frame limit.
    #[must_use]
    pub const fn with_max_frame(framing: Framing, max_frame: usize) -> Self {
        Self {
            framing,
            max_frame,
            pending_len: None,
            scanned: 0,
        }
    }

    /// The framing in use.
    #[must_use]
    pub const fn framing(&self) -> Framing {
        self.framing
    }

    /// Split off the next complete line, including its `\n`.
    fn take_line(&mut self, src: &mut BytesMut) -> Option<Bytes> {
        let found = src[self.scanned..].iter().position(|b| *b == b'\n');
        match found {
            Some(pos) => {
                let line = src.split_to(self.scanned + pos + 1).freeze();
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = src.len();
                None
            }
        }
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        loop {
            let Some(line) = self.take_line(src) else {
                if src.len() > self.max_frame {
                    return Err(FrameError::TooLarge {
                        len: src.len(),
                        max: self.max_frame,
                    });
                }
                return Ok(None);
            };
            let message = trimmed(&line);
            if message.is_empty() {
                continue;
            }
            if message.len() > self.max_frame {
                return Err(FrameError::TooLarge {
                    len: message.len(),
                    max: self.max_frame,
                });
            }
            return Ok(Some(message));
        }
    }

    fn decode_length(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        loop {
            if let Some(len) = self.pending_len {
                if src.len() < len {
                    src.reserve(len - src.len());
                    return Ok(None);
                }
                self.pending_len = None;
                let message = trimmed(&src.split_to(len).freeze());
                if message.is_empty() {
                    continue;
                }
                return Ok(Some(message));
            }

            let Some(line) = self.take_line(src) else {
                if src.len() > MAX_LENGTH_LINE {
                    return Err(FrameError::InvalidLength {
                        line: String::from_utf8_lossy(&src[..MAX_LENGTH_LINE]).into_owned(),
                    });
                }
                return Ok(None);
            };
            let prefix = trimmed(&line);
            if prefix.is_empty() {
                continue;
            }
            let len: usize = std::str::from_utf8(&prefix)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| FrameError::InvalidLength {
                    line: String::from_utf8_lossy(&prefix).into_owned(),
                })?;
            if len > self.max_frame {
                return Err(FrameError::TooLarge {
                    len,
                    max: self.max_frame,
                });
            }
            self.pending_len = Some(len);
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framing {
            Framing::Lines => self.decode_line(src),
            Framing::Length => self.decode_length(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        let rest = src.split().freeze();
        self.scanned = 0;
        match (self.framing, self.pending_len.take()) {
            (_, Some(expected)) => Err(FrameError::Truncated {
                expected,
                received: rest.len(),
            }),
            (Framing::Lines, None) => {
                let message = trimmed(&rest);
                Ok((!message.is_empty()).then_some(message))
            }
            (Framing::Length, None) => {
                if trimmed(&rest).is_empty() {
                    Ok(None)
                } else {
                    Err(FrameError::InvalidLength {
                        line: String::from_utf8_lossy(&rest).into_owned(),
                    })
                }
            }
        }
    }
}

fn trimmed(bytes: &Bytes) -> Bytes {
    bytes.slice_ref(bytes.trim_ascii())
}
