//! Per-connection state owned by a worker thread.

use std::io::{self, Read};
use std::time::Instant;

use tracing::debug;

use crate::protocol::{FrameDecoder, FrameError, FrameState, Response, ResponseError, ResponseWriter};
use crate::transport::{ConnectionStream, Peer};

use super::DISPATCH_TARGET;

/// Result of reading one request frame.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// A complete payload.
    Frame(Vec<u8>),
    /// The peer closed the connection before completing a frame.
    Closed { received: usize },
    /// The header was malformed.
    Protocol(FrameError),
    /// Reading failed.
    Failed(io::Error),
}

/// One accepted connection.
///
/// The session owns the stream; dropping it shuts the socket down, so the
/// connection is released on every exit path of the worker.
#[derive(Debug)]
pub(crate) struct Session {
    stream: ConnectionStream,
    peer: Peer,
    read_buffer_size: usize,
    opened: Instant,
}

impl Session {
    pub(crate) fn new(stream: ConnectionStream, peer: Peer, read_buffer_size: usize) -> Self {
        Self {
            stream,
            peer,
            read_buffer_size: read_buffer_size.max(1),
            opened: Instant::now(),
        }
    }

    pub(crate) const fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Reads until one frame is complete, the header is rejected or the
    /// stream ends. Reads are at most `read_buffer_size` bytes each.
    pub(crate) fn read_frame(&mut self) -> ReadOutcome {
        let mut decoder = FrameDecoder::new();
        let mut chunk = vec![0_u8; self.read_buffer_size];
        let mut received = 0_usize;
        loop {
            let read = match read_with_retry(&mut self.stream, &mut chunk) {
                Ok(0) => return ReadOutcome::Closed { received },
                Ok(read) => read,
                Err(error) => return ReadOutcome::Failed(error),
            };
            received += read;
            decoder.feed(&chunk[..read]);
            match decoder.state() {
                FrameState::Complete { .. } | FrameState::ProtocolError(_) => break,
                FrameState::AwaitingHeader { .. } | FrameState::Accumulating { .. } => {}
            }
        }
        match decoder.finish() {
            Ok(payload) => ReadOutcome::Frame(payload),
            Err(error) => ReadOutcome::Protocol(error),
        }
    }

    /// Writes the single framed reply of this connection.
    pub(crate) fn respond(&mut self, response: &Response) -> Result<(), ResponseError> {
        ResponseWriter::new(&mut self.stream).write_response(response)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(error) = self.stream.shutdown()
            && error.kind() != io::ErrorKind::NotConnected
        {
            debug!(
                target: DISPATCH_TARGET,
                peer = %self.peer,
                error = %error,
                "socket shutdown failed"
            );
        }
        debug!(
            target: DISPATCH_TARGET,
            peer = %self.peer,
            elapsed_ms = self.opened.elapsed().as_millis(),
            "connection closed"
        );
    }
}

fn read_with_retry(stream: &mut ConnectionStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}
