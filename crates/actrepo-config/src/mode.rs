//! Octal permission bits for the Unix socket node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission bits written in octal, e.g. `0664`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileMode(u32);

impl FileMode {
    /// Wraps raw permission bits, keeping only the low twelve.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits & 0o7777)
    }

    /// Raw permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = FileModeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 4 {
            return Err(FileModeParseError(input.to_owned()));
        }
        u32::from_str_radix(digits, 8)
            .map(Self::new)
            .map_err(|_| FileModeParseError(input.to_owned()))
    }
}

impl TryFrom<String> for FileMode {
    type Error = FileModeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_string()
    }
}

/// Error raised when a permission string is not octal.
#[derive(Debug, Error)]
#[error("invalid octal file mode '{0}'")]
pub struct FileModeParseError(String);
