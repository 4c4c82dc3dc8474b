//! Test helpers for the transport module.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{ConnectionHandler, ConnectionStream, Peer};

/// Records the peer of every connection it is handed.
#[derive(Debug, Default)]
pub(crate) struct RecordingHandler {
    peers: Mutex<Vec<Peer>>,
}

impl RecordingHandler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn peers(&self) -> Vec<Peer> {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Polls until at least `expected` connections were handled.
    pub(crate) fn wait_for(&self, expected: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if self.peers().len() >= expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl ConnectionHandler for RecordingHandler {
    fn handle(&self, _stream: ConnectionStream, peer: Peer) {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(peer);
    }
}
