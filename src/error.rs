//! Typed errors for the credential, content, and delivery paths.
//!
//! Expected authorization denials are NOT errors; they are carried as
//! [`crate::security::session::DenyReason`] values so handlers can shape the
//! response without unwinding.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Settings missing or malformed at startup. Always fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// Email delivery failed. Fatal during initialization, recoverable
    /// during a scheduled rotation (the previous credential stays in place).
    #[error("email delivery failed: {0}")]
    Delivery(String),

    /// Content file could not be loaded or saved.
    #[error("content error: {0}")]
    Content(String),

    /// Any other internal fault. Logged with context, surfaced to callers
    /// as a generic failure.
    #[error("internal error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }

    #[must_use]
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        assert_eq!(
            Error::config("missing admin email").to_string(),
            "configuration error: missing admin email"
        );
        assert_eq!(
            Error::delivery("smtp timeout").to_string(),
            "email delivery failed: smtp timeout"
        );
    }
}
