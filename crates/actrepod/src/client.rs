//! Minimal client for sending one command to a running daemon.
//!
//! ```no_run
//! use actrepo_config::SocketEndpoint;
//! use actrepod::client::{CommandRequest, send_command};
//!
//! let endpoint = SocketEndpoint::tcp("127.0.0.1", 7090);
//! let response = send_command(&endpoint, &CommandRequest::new(0, 0))?;
//! assert_eq!(response.description, "pong");
//! # Ok::<(), actrepod::client::ClientError>(())
//! ```

use std::io::{self, Read, Write};
use std::net::TcpStream;

use quick_xml::escape::escape;
use thiserror::Error;

use actrepo_config::SocketEndpoint;

use crate::protocol::{FrameError, Response, ResponseError, frame};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Errors raised while exchanging a command with the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid reply frame: {0}")]
    Frame(#[from] FrameError),
    #[error("reply is not valid UTF-8")]
    NotUtf8,
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
}

/// A command to send: routing ids, optional token and handler parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    sysid: i64,
    cmdid: i64,
    token: Option<String>,
    params: Vec<(String, String)>,
}

impl CommandRequest {
    #[must_use]
    pub const fn new(sysid: i64, cmdid: i64) -> Self {
        Self {
            sysid,
            cmdid,
            token: None,
            params: Vec::new(),
        }
    }

    /// Sets the correlation token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds a `<name>value</name>` parameter. `name` must be a valid XML
    /// element name; `value` is escaped.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Renders the command document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<command><sysid>{}</sysid><cmdid>{}</cmdid>",
            self.sysid, self.cmdid
        );
        if let Some(token) = &self.token {
            xml.push_str(&format!("<token>{}</token>", escape(token.as_str())));
        }
        for (name, value) in &self.params {
            xml.push_str(&format!("<{name}>{}</{name}>", escape(value.as_str())));
        }
        xml.push_str("</command>");
        xml
    }
}

/// Sends `request` to `endpoint` and returns the decoded reply.
///
/// # Errors
///
/// Returns [`ClientError`] if the connection, the exchange or decoding
/// fails.
pub fn send_command(
    endpoint: &SocketEndpoint,
    request: &CommandRequest,
) -> Result<Response, ClientError> {
    let payload = frame::encode(request.to_xml().as_bytes())?;
    let reply = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port))
                .map_err(|source| connect_error(endpoint, source))?;
            exchange(stream, &payload)?
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => {
            let stream = UnixStream::connect(path.as_std_path())
                .map_err(|source| connect_error(endpoint, source))?;
            exchange(stream, &payload)?
        }
        #[cfg(not(unix))]
        SocketEndpoint::Unix { .. } => {
            return Err(ClientError::UnsupportedUnix {
                endpoint: endpoint.to_string(),
            });
        }
    };

    let body = frame::decode(&reply)?;
    let text = std::str::from_utf8(&body).map_err(|_| ClientError::NotUtf8)?;
    Ok(Response::from_xml(text)?)
}

fn connect_error(endpoint: &SocketEndpoint, source: io::Error) -> ClientError {
    ClientError::Connect {
        endpoint: endpoint.to_string(),
        source,
    }
}

fn exchange<S: Read + Write>(mut stream: S, payload: &[u8]) -> Result<Vec<u8>, ClientError> {
    stream.write_all(payload)?;
    stream.flush()?;
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;
    Ok(reply)
}
