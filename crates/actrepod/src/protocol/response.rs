//! Response envelope written back to clients.
//!
//! Every connection that receives a complete frame gets exactly one framed
//! reply of the form
//! `<response><status>…</status><description>…</description></response>`.
//! Failed and warning replies carry an [`ErrorDetail`] document, escaped,
//! as their description.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::frame::{self, FrameError};
use crate::actions::Severity;

/// Errors raised while encoding, decoding or writing an envelope.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// XML serialization failed.
    #[error("failed to encode response: {message}")]
    Encode { message: String },
    /// The payload is not a response envelope.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
    /// The encoded envelope cannot be framed.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Writing to the peer failed.
    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError {
    fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Outcome token carried in `<status>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The handler returned a result.
    Success,
    /// The command ran into a recoverable problem.
    Warning,
    /// The command could not be carried out.
    Failed,
}

impl ResponseStatus {
    /// Wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }
}

impl From<Severity> for ResponseStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Self::Warning,
            Severity::Failed => Self::Failed,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = ResponseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim() {
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "failed" => Ok(Self::Failed),
            other => Err(ResponseError::decode(format!("unknown status '{other}'"))),
        }
    }
}

/// Structured description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "error")]
pub struct ErrorDetail {
    /// Failure class, for example `BadModule` or `HandlerError`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Layers the error passed through, joined with `/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorDetail {
    /// Builds a detail without trace markers.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: None,
        }
    }

    /// Records the trace markers; an empty list leaves the trace unset.
    #[must_use]
    pub fn with_trace(mut self, markers: &[&str]) -> Self {
        self.trace = (!markers.is_empty()).then(|| markers.join("/"));
        self
    }

    /// Serializes the detail as an `<error>` document.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Encode`] if serialization fails.
    pub fn to_xml(&self) -> Result<String, ResponseError> {
        quick_xml::se::to_string(self).map_err(|error| ResponseError::Encode {
            message: error.to_string(),
        })
    }

    /// Parses an `<error>` document.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Decode`] if `xml` is not an error detail.
    pub fn from_xml(xml: &str) -> Result<Self, ResponseError> {
        quick_xml::de::from_str(xml).map_err(|error| ResponseError::Decode {
            message: error.to_string(),
        })
    }
}

/// The reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "response")]
pub struct Response {
    pub status: ResponseStatus,
    pub description: String,
}

impl Response {
    /// Successful reply carrying the handler's result.
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            description: description.into(),
        }
    }

    /// Warning reply.
    pub fn warning(description: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Warning,
            description: description.into(),
        }
    }

    /// Failed reply.
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            description: description.into(),
        }
    }

    /// Builds an error reply whose description is the serialized `detail`.
    ///
    /// Warnings append `supplement`, when present, after the detail document.
    /// Failed replies never carry it.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Encode`] if the detail cannot be serialized.
    pub fn from_error(
        severity: Severity,
        detail: &ErrorDetail,
        supplement: Option<&str>,
    ) -> Result<Self, ResponseError> {
        let mut description = detail.to_xml()?;
        if let (Severity::Warning, Some(extra)) = (severity, supplement) {
            description.push('\n');
            description.push_str(extra);
        }
        Ok(Self {
            status: severity.into(),
            description,
        })
    }

    /// Serializes the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Encode`] if serialization fails.
    pub fn to_xml(&self) -> Result<String, ResponseError> {
        quick_xml::se::to_string(self).map_err(|error| ResponseError::Encode {
            message: error.to_string(),
        })
    }

    /// Parses an envelope.
    ///
    /// The description keeps its text exactly, including surrounding
    /// whitespace. A missing `<description>` reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Decode`] if `xml` is not a response.
    pub fn from_xml(xml: &str) -> Result<Self, ResponseError> {
        let document =
            Document::parse(xml).map_err(|error| ResponseError::decode(error.to_string()))?;
        let root = document.root_element();
        if !root.has_tag_name("response") {
            return Err(ResponseError::decode(format!(
                "expected <response>, found <{}>",
                root.tag_name().name()
            )));
        }
        let status: ResponseStatus = child(root, "status")
            .map(text_of)
            .ok_or_else(|| ResponseError::decode("missing <status>"))?
            .parse()?;
        let description = child(root, "description").map(text_of).unwrap_or_default();
        Ok(Self {
            status,
            description,
        })
    }

    /// Serializes and frames the envelope.
    ///
    /// # Errors
    ///
    /// Returns an encode error or [`FrameError::PayloadTooLarge`].
    pub fn to_frame(&self) -> Result<Vec<u8>, ResponseError> {
        let xml = self.to_xml()?;
        Ok(frame::encode(xml.as_bytes())?)
    }

    /// Parses the detail document at the start of an error description.
    ///
    /// Returns `None` for success replies and descriptions that do not start
    /// with an `<error>` document.
    #[must_use]
    pub fn error_detail(&self) -> Option<ErrorDetail> {
        if self.status == ResponseStatus::Success {
            return None;
        }
        let end = self.description.find("</error>")? + "</error>".len();
        ErrorDetail::from_xml(&self.description[..end]).ok()
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|candidate| candidate.has_tag_name(name))
}

fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect()
}

/// Writes framed envelopes to a stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps `writer`; each envelope is flushed after writing.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Frames, writes and flushes `response`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, framing or writing fails.
    pub fn write_response(&mut self, response: &Response) -> Result<(), ResponseError> {
        let frame = response.to_frame()?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
