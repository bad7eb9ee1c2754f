//! Access token handling.
//!
//! Hub tokens grant write access to every repository of their owner, so they
//! must never end up in logs, error messages, or `Debug` output of the config.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// A token string that redacts itself in `Debug` and `Display`.
///
/// The value is only reachable through [`expose_secret`][SecretString::expose_secret].
///
/// # Example
///
/// ```
/// use modelpush_core::SecretString;
///
/// let token = SecretString::new("hf_abcdef");
/// assert_eq!(format!("{:?}", token), "SecretString([REDACTED])");
/// assert_eq!(token.expose_secret(), "hf_abcdef");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Wrap a token value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    /// Wrap a value that may be absent or blank.
    ///
    /// Blank values (empty or whitespace only) count as absent, the same way an
    /// exported-but-empty `HF_TOKEN` does.
    pub fn non_empty(secret: Option<impl Into<String>>) -> Option<Self> {
        let secret: String = secret?.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::new(trimmed))
        }
    }

    /// Read a token from an environment variable, ignoring blank values.
    pub fn from_env(var: &str) -> Option<Self> {
        Self::non_empty(std::env::var(var).ok())
    }

    /// Expose the token value.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.inner)
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Best effort: the allocator may already hold copies from reallocation.
        // SAFETY: NUL bytes keep the buffer valid UTF-8 and we own it exclusively.
        unsafe {
            for byte in self.inner.as_bytes_mut() {
                std::ptr::write_volatile(byte, 0);
            }
        }
    }
}
