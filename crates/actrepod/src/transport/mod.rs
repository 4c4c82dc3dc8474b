//! Socket transport: binds the TCP and Unix endpoints and hands every
//! accepted connection to a tracked worker thread.

mod errors;
mod handler;
mod listener;
#[cfg(unix)]
mod permissions;
mod server;
#[cfg(test)]
mod test_utils;
mod tracker;

pub use self::errors::ListenerError;
pub use self::handler::Peer;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
#[cfg(test)]
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::server::{Server, ServerHandle};
#[cfg(test)]
pub(crate) use self::test_utils::RecordingHandler;
pub use self::tracker::{WorkerGuard, WorkerTracker};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
