//! Length-prefixed framing: `"<decimal-length>:<payload>"`.
//!
//! Decoding is a pure state machine. [`FrameState::advance`] takes the
//! current state and the bytes of one socket read and returns the next state
//! together with the number of bytes it consumed, so frames split across any
//! number of reads (including inside the header) assemble to the same
//! payload as a single read.

use std::mem;

use thiserror::Error;

/// Longest header, delimiter included: six decimal digits and `':'`.
pub const MAX_HEADER_LEN: usize = 7;

/// Largest payload a six digit header can declare.
pub const MAX_PAYLOAD_LEN: usize = 999_999;

const DELIMITER: u8 = b':';

/// Framing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// No delimiter within the header bound.
    #[error("frame length delimiter ':' not found within the first {MAX_HEADER_LEN} bytes")]
    MissingDelimiter,
    /// The header is empty or not an unsigned decimal.
    #[error("frame length '{header}' is not an unsigned decimal number")]
    InvalidLength { header: String },
    /// The payload is too large to be framed.
    #[error("payload of {len} bytes exceeds the {MAX_PAYLOAD_LEN} byte frame limit")]
    PayloadTooLarge { len: usize },
    /// The input ended before the frame was complete.
    #[error("frame truncated: {missing} more bytes expected")]
    Truncated { missing: usize },
}

/// Progress of one frame through the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameState {
    /// No length known yet; holds the header bytes seen so far.
    AwaitingHeader { header: Vec<u8> },
    /// Length known, payload incomplete.
    Accumulating { remaining: usize, payload: Vec<u8> },
    /// The declared length has been read.
    Complete { payload: Vec<u8> },
    /// The header was malformed. No further input is accepted.
    ProtocolError(FrameError),
}

/// Outcome of feeding one chunk to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the chunk.
    pub state: FrameState,
    /// Bytes of the chunk that belong to this frame.
    pub consumed: usize,
}

impl Default for FrameState {
    fn default() -> Self {
        Self::AwaitingHeader { header: Vec::new() }
    }
}

impl FrameState {
    /// Initial decoder state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for [`Complete`](Self::Complete) and
    /// [`ProtocolError`](Self::ProtocolError).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::ProtocolError(_))
    }

    /// Feeds `chunk` to the decoder.
    ///
    /// Terminal states consume nothing and are returned unchanged. Bytes past
    /// the declared payload length are left unconsumed.
    #[must_use]
    pub fn advance(self, chunk: &[u8]) -> Transition {
        match self {
            Self::AwaitingHeader { header } => read_header(header, chunk),
            Self::Accumulating { remaining, payload } => accumulate(remaining, payload, chunk),
            terminal @ (Self::Complete { .. } | Self::ProtocolError(_)) => Transition {
                state: terminal,
                consumed: 0,
            },
        }
    }
}

fn read_header(mut header: Vec<u8>, chunk: &[u8]) -> Transition {
    let room = MAX_HEADER_LEN.saturating_sub(header.len());
    let window = &chunk[..chunk.len().min(room)];

    let Some(position) = window.iter().position(|byte| *byte == DELIMITER) else {
        header.extend_from_slice(window);
        let state = if header.len() >= MAX_HEADER_LEN {
            FrameState::ProtocolError(FrameError::MissingDelimiter)
        } else {
            FrameState::AwaitingHeader { header }
        };
        return Transition {
            state,
            consumed: window.len(),
        };
    };

    header.extend_from_slice(&window[..position]);
    let header_consumed = position + 1;
    match parse_length(&header) {
        Ok(declared) => {
            let payload = Vec::with_capacity(declared);
            let rest = accumulate(declared, payload, &chunk[header_consumed..]);
            Transition {
                state: rest.state,
                consumed: header_consumed + rest.consumed,
            }
        }
        Err(error) => Transition {
            state: FrameState::ProtocolError(error),
            consumed: header_consumed,
        },
    }
}

fn accumulate(remaining: usize, mut payload: Vec<u8>, chunk: &[u8]) -> Transition {
    let take = remaining.min(chunk.len());
    payload.extend_from_slice(&chunk[..take]);
    let remaining = remaining - take;
    let state = if remaining == 0 {
        FrameState::Complete { payload }
    } else {
        FrameState::Accumulating { remaining, payload }
    };
    Transition {
        state,
        consumed: take,
    }
}

fn parse_length(header: &[u8]) -> Result<usize, FrameError> {
    let invalid = || FrameError::InvalidLength {
        header: String::from_utf8_lossy(header).into_owned(),
    };
    if header.is_empty() || !header.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    std::str::from_utf8(header)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(invalid)
}

/// Incremental decoder wrapping [`FrameState`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: FrameState,
}

impl FrameDecoder {
    /// Creates a decoder awaiting a header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the number of bytes consumed.
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        let transition = mem::take(&mut self.state).advance(chunk);
        self.state = transition.state;
        transition.consumed
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FrameState {
        &self.state
    }

    /// Returns `true` once no further input will be accepted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Bytes still needed to complete the payload, when the length is known.
    #[must_use]
    pub const fn remaining(&self) -> Option<usize> {
        match &self.state {
            FrameState::Accumulating { remaining, .. } => Some(*remaining),
            FrameState::Complete { .. } => Some(0),
            FrameState::AwaitingHeader { .. } | FrameState::ProtocolError(_) => None,
        }
    }

    /// Consumes the decoder, returning the payload or the reason there is
    /// none.
    ///
    /// # Errors
    ///
    /// Returns the protocol error, or [`FrameError::Truncated`] if the frame
    /// is still incomplete.
    pub fn finish(self) -> Result<Vec<u8>, FrameError> {
        match self.state {
            FrameState::Complete { payload } => Ok(payload),
            FrameState::ProtocolError(error) => Err(error),
            FrameState::Accumulating { remaining, .. } => {
                Err(FrameError::Truncated { missing: remaining })
            }
            FrameState::AwaitingHeader { header } if header.is_empty() => {
                Err(FrameError::Truncated { missing: 0 })
            }
            FrameState::AwaitingHeader { .. } => Err(FrameError::MissingDelimiter),
        }
    }
}

/// Frames `payload` as `"<len>:<payload>"`.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] when the length needs more than
/// six digits.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }
    let header = format!("{}:", payload.len());
    let mut frame = Vec::with_capacity(header.len() + payload.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Decodes a whole frame held in memory.
///
/// # Errors
///
/// Returns any framing error, including [`FrameError::Truncated`] when
/// `bytes` ends early.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut decoder = FrameDecoder::new();
    decoder.feed(bytes);
    decoder.finish()
}
