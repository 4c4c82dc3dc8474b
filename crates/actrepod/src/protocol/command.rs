//! Command documents carried inside request frames.
//!
//! A command is an XML document rooted at `<command>` whose `<sysid>` and
//! `<cmdid>` children select the action to run. `<token>` is optional; every
//! other child is a handler parameter and is left for the handler to read
//! from the root element.

use roxmltree::{Document, Node};
use thiserror::Error;

const ROOT: &str = "command";
const SYSID: &str = "sysid";
const CMDID: &str = "cmdid";
const TOKEN: &str = "token";

/// Reasons a payload is not a usable command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The payload is not UTF-8.
    #[error("command payload is not valid UTF-8")]
    NotUtf8,
    /// The payload is not well-formed XML.
    #[error("malformed command document: {message}")]
    Xml { message: String },
    /// The root element is not `<command>`.
    #[error("expected <{ROOT}> root element, found <{found}>")]
    UnexpectedRoot { found: String },
    /// A required element is absent.
    #[error("command is missing <{field}>")]
    MissingField { field: &'static str },
    /// A numeric element does not hold an integer.
    #[error("<{field}> must be an integer, found '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl CommandError {
    /// Short machine-readable name of the failure.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotUtf8 | Self::Xml { .. } => "MalformedCommand",
            Self::UnexpectedRoot { .. } | Self::MissingField { .. } | Self::InvalidField { .. } => {
                "InvalidCommand"
            }
        }
    }
}

/// A parsed command: the document plus the routing fields read from it.
#[derive(Debug)]
pub struct Command<'input> {
    document: Document<'input>,
    sysid: i64,
    cmdid: i64,
    token: String,
}

impl<'input> Command<'input> {
    /// Parses a command from UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the text is not XML, the root is not
    /// `<command>`, or `<sysid>`/`<cmdid>` are missing or not integers.
    pub fn parse(text: &'input str) -> Result<Self, CommandError> {
        let document = Document::parse(text).map_err(|error| CommandError::Xml {
            message: error.to_string(),
        })?;
        let root = document.root_element();
        if !root.has_tag_name(ROOT) {
            return Err(CommandError::UnexpectedRoot {
                found: root.tag_name().name().to_owned(),
            });
        }

        let sysid = integer_field(root, SYSID)?;
        let cmdid = integer_field(root, CMDID)?;
        let token = child_text(root, TOKEN)
            .map(|text| text.trim().to_owned())
            .unwrap_or_default();

        Ok(Self {
            document,
            sysid,
            cmdid,
            token,
        })
    }

    /// Parses a command from raw payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotUtf8`] for non-UTF-8 payloads and otherwise
    /// behaves as [`parse`](Self::parse).
    pub fn from_payload(payload: &'input [u8]) -> Result<Self, CommandError> {
        let text = std::str::from_utf8(payload).map_err(|_| CommandError::NotUtf8)?;
        Self::parse(text)
    }

    /// Subsystem id.
    #[must_use]
    pub const fn sysid(&self) -> i64 {
        self.sysid
    }

    /// Command id within the subsystem.
    #[must_use]
    pub const fn cmdid(&self) -> i64 {
        self.cmdid
    }

    /// Correlation token; empty when the request carried none.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The `<command>` element handed to the action handler.
    #[must_use]
    pub fn root(&self) -> Node<'_, 'input> {
        self.document.root_element()
    }
}

fn child_text<'a>(parent: Node<'a, '_>, name: &str) -> Option<&'a str> {
    parent
        .children()
        .find(|child| child.has_tag_name(name))
        .map(|child| child.text().unwrap_or_default())
}

fn integer_field(parent: Node<'_, '_>, field: &'static str) -> Result<i64, CommandError> {
    let text = child_text(parent, field).ok_or(CommandError::MissingField { field })?;
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| CommandError::InvalidField {
        field,
        value: trimmed.to_owned(),
    })
}
