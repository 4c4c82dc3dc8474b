//! Connection handler that runs one framed command per connection.
//!
//! The worker reads a frame, parses the command document, invokes the
//! action through the shared [`ActionRepository`] with source
//! [`ActionSource::FireLoop`], writes exactly one framed response and closes
//! the connection. A peer that disconnects or fails mid-read gets no reply.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{Span, debug, field, info, info_span, warn};

use crate::actions::{ActionContext, ActionRepository, ActionSource};
use crate::protocol::{Command, Response, ResponseError};
use crate::transport::{ConnectionHandler, ConnectionStream, Peer};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::session::{ReadOutcome, Session};

/// Dispatches socket commands into the action repository.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    repository: Arc<ActionRepository>,
    read_buffer_size: usize,
}

impl DispatchConnectionHandler {
    /// Creates a handler reading at most `read_buffer_size` bytes per read.
    pub fn new(repository: Arc<ActionRepository>, read_buffer_size: usize) -> Self {
        Self {
            repository,
            read_buffer_size,
        }
    }

    fn serve(&self, mut session: Session) {
        let payload = match session.read_frame() {
            ReadOutcome::Frame(payload) => payload,
            ReadOutcome::Closed { received } => {
                debug!(
                    target: DISPATCH_TARGET,
                    received,
                    "client disconnected before completing a request"
                );
                return;
            }
            ReadOutcome::Failed(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                return;
            }
            ReadOutcome::Protocol(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejecting malformed frame");
                reply(&mut session, Err(error.into()));
                return;
            }
        };

        let result = self.execute(&payload, session.peer());
        reply(&mut session, result);
    }

    fn execute(&self, payload: &[u8], peer: &Peer) -> Result<String, DispatchError> {
        let command = Command::from_payload(payload)?;
        let span = Span::current();
        span.record("sid", command.sysid());
        span.record("cid", command.cmdid());
        span.record("token", command.token());
        debug!(target: DISPATCH_TARGET, "dispatching command");

        let context = ActionContext::remote(command.token(), peer.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.repository.run_cmd(
                command.sysid(),
                command.cmdid(),
                ActionSource::FireLoop,
                command.root(),
                &context,
            )
        }));
        match outcome {
            Ok(result) => Ok(result?),
            Err(payload) => Err(DispatchError::handler_panicked(payload.as_ref())),
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream, peer: Peer) {
        let span = info_span!(
            target: DISPATCH_TARGET,
            "connection",
            peer = %peer,
            sid = field::Empty,
            cid = field::Empty,
            token = field::Empty,
        );
        let _entered = span.enter();
        self.serve(Session::new(stream, peer, self.read_buffer_size));
    }
}

/// Builds the envelope for `result` and writes it. Write failures are
/// logged; the session closes the socket either way.
fn reply(session: &mut Session, result: Result<String, DispatchError>) {
    let response = match result {
        Ok(description) => {
            info!(target: DISPATCH_TARGET, status = "success", "command completed");
            Response::success(description)
        }
        Err(error) => {
            warn!(
                target: DISPATCH_TARGET,
                status = %error.severity(),
                kind = error.kind(),
                %error,
                "command failed"
            );
            error_response(&error)
        }
    };

    match session.respond(&response) {
        Ok(()) => {}
        Err(ResponseError::Io(error)) => {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
        Err(error) => {
            // The reply itself could not be framed; report that instead.
            warn!(target: DISPATCH_TARGET, %error, "failed to encode response");
            let fallback = error_response(&DispatchError::from(error));
            if let Err(error) = session.respond(&fallback) {
                warn!(target: DISPATCH_TARGET, %error, "failed to write fallback response");
            }
        }
    }
}

fn error_response(error: &DispatchError) -> Response {
    Response::from_error(error.severity(), &error.detail(), error.supplement())
        .unwrap_or_else(|_| Response::failed(error.to_string()))
}
