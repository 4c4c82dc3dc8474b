//! Connection workers: one framed command in, one framed response out.
//!
//! ## Protocol
//!
//! A client writes a single frame, `<len>:<payload>`, whose payload is a
//! command document:
//!
//! ```xml
//! <command><sysid>0</sysid><cmdid>0</cmdid><token>abc</token></command>
//! ```
//!
//! The daemon answers with one frame holding a response envelope and closes
//! the connection:
//!
//! ```xml
//! <response><status>success</status><description>pong</description></response>
//! ```
//!
//! Routing failures and handler errors are reported with status `warning`
//! or `failed` and an `<error>` document as the description.

mod errors;
mod handler;
mod session;

pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;

/// Tracing target for connection workers.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
