//! Redacting wrapper for credentials.
//!
//! Access tokens flow through configuration and request construction; this
//! wrapper keeps them out of `Debug`/`Display` output and therefore out of logs.

use std::fmt;

/// A string whose value is redacted in `Debug` and `Display` output.
///
/// # Example
///
/// ```
/// use birdwire::config::SecretString;
///
/// let token = SecretString::new("AAAA-bearer-token");
/// assert_eq!(format!("{token:?}"), "<REDACTED>");
/// assert_eq!(token.expose(), "AAAA-bearer-token");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the underlying value.
    ///
    /// Only call this at the point the secret is written to the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
