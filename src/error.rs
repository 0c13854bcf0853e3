//! Error types for certificate expiry checks.
//!
//! Every failure of a check maps to exactly one [`ExpiryError`] variant, so
//! callers can tell a DNS problem from a refused connection, a timeout or a
//! TLS failure without inspecting message text.

use std::fmt;
use std::io;

use strum_macros::{AsRefStr, Display};

/// Error returned when a certificate expiry check cannot produce a duration.
#[derive(Debug)]
pub enum ExpiryError {
    /// The hostname did not resolve to any address
    NameResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying resolver error
        source: io::Error,
    },

    /// The remote endpoint actively refused the TCP connection
    ConnectionRefused {
        /// The address (host:port) that refused
        address: String,
    },

    /// Connect or handshake did not finish within the configured bound
    Timeout {
        /// The address (host:port) involved
        address: String,
        /// Which step timed out ("connect" or "handshake")
        operation: String,
    },

    /// TLS negotiation or certificate verification failed
    Tls {
        /// The hostname the handshake was for
        hostname: String,
        /// Why the handshake failed
        reason: String,
    },

    /// Port outside 1..=65535, rejected before any network I/O
    InvalidPort {
        /// The rejected value
        port: i64,
    },

    /// Invalid input provided to the API
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// The notAfter string did not match "Mon DD HH:MM:SS YYYY TZ"
    Parse {
        /// The offending input
        input: String,
        /// What did not match
        reason: String,
    },

    /// The handshake completed but no usable leaf certificate was presented
    Certificate {
        /// Description of what went wrong
        reason: String,
    },

    /// TCP connection failed for a reason other than refusal or timeout
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Anything else
    Unexpected {
        /// Error message
        message: String,
    },
}

/// Classification of an [`ExpiryError`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum ErrorKind {
    #[strum(serialize = "NameResolutionError")]
    NameResolution,
    ConnectionRefused,
    Timeout,
    #[strum(serialize = "TLSError")]
    Tls,
    InvalidPort,
    InvalidInput,
    #[strum(serialize = "ParseError")]
    Parse,
    #[strum(serialize = "CertificateError")]
    Certificate,
    #[strum(serialize = "ConnectionError")]
    ConnectionFailed,
    #[strum(serialize = "UnexpectedError")]
    Unexpected,
}

impl ExpiryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NameResolution { .. } => ErrorKind::NameResolution,
            Self::ConnectionRefused { .. } => ErrorKind::ConnectionRefused,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Tls { .. } => ErrorKind::Tls,
            Self::InvalidPort { .. } => ErrorKind::InvalidPort,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Certificate { .. } => ErrorKind::Certificate,
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Classifies an I/O error from a TCP connect attempt against `address`.
    pub(crate) fn from_connect(address: &str, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused {
                address: address.to_string(),
            },
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout {
                address: address.to_string(),
                operation: "connect".to_string(),
            },
            _ => Self::ConnectionFailed {
                address: address.to_string(),
                source: e,
            },
        }
    }
}

impl fmt::Display for ExpiryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameResolution { hostname, source } => {
                write!(f, "Failed to resolve hostname {}: {}", hostname, source)
            }
            Self::ConnectionRefused { address } => {
                write!(f, "Connection refused by {}", address)
            }
            Self::Timeout { address, operation } => {
                write!(f, "Timed out during {} to {}", operation, address)
            }
            Self::Tls { hostname, reason } => {
                write!(f, "TLS handshake with {} failed: {}", hostname, reason)
            }
            Self::InvalidPort { port } => {
                write!(f, "Invalid port {}: must be between 1 and 65535", port)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::Parse { input, reason } => {
                write!(f, "Cannot parse expiry date '{}': {}", input, reason)
            }
            Self::Certificate { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection to {} failed: {}", address, source)
            }
            Self::Unexpected { message } => {
                write!(f, "Unexpected error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpiryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NameResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<&str> for ExpiryError {
    fn from(s: &str) -> Self {
        Self::Unexpected {
            message: s.to_string(),
        }
    }
}

impl From<String> for ExpiryError {
    fn from(s: String) -> Self {
        Self::Unexpected { message: s }
    }
}

impl From<openssl::error::ErrorStack> for ExpiryError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::Unexpected {
            message: format!("OpenSSL: {}", e),
        }
    }
}
