//! Reports how long until a host's TLS certificate expires.
//!
//! A check connects to `host:port`, completes a verified TLS handshake with
//! SNI, reads the leaf certificate's `notAfter` field and returns the signed
//! duration from now until then. A negative duration means the certificate
//! has already expired; that is a result, not an error.
//!
//! ```no_run
//! use certexpiry::{ExpiryChecker, Target};
//!
//! let target = Target::new("example.com", 443)?;
//! let remaining = ExpiryChecker::new().check(&target)?;
//! println!("{} days left", remaining.num_days());
//! # Ok::<(), certexpiry::ExpiryError>(())
//! ```

pub mod config;
pub mod error;
pub mod expiry;
pub mod host;
pub mod logger;
pub mod output;

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod};
use openssl::x509::X509VerifyResult;
use serde::{Deserialize, Serialize};

pub use error::{ErrorKind, ExpiryError};
pub use expiry::{format_remaining, parse_not_after, time_remaining};
pub use host::{clean_hostname, split_host_port, validate_port, DEFAULT_PORT};

/// Default bound for the TCP connect and the TLS handshake.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A TLS endpoint: hostname (or IP literal) and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
}

impl Target {
    /// Builds a validated target.
    ///
    /// # Errors
    ///
    /// * [`ExpiryError::InvalidPort`] if `port` is outside 1..=65535
    /// * [`ExpiryError::InvalidInput`] if `hostname` is empty or malformed
    pub fn new(hostname: &str, port: i64) -> Result<Target, ExpiryError> {
        let port = validate_port(port)?;
        host::validate_hostname(hostname)?;
        Ok(Target {
            hostname: hostname.to_string(),
            port,
        })
    }

    /// Parses `host[:port]` (or a URL), falling back to `default_port`.
    pub fn parse(input: &str, default_port: u16) -> Result<Target, ExpiryError> {
        let (hostname, port) = split_host_port(input)?;
        Target::new(&hostname, i64::from(port.unwrap_or(default_port)))
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn address(&self) -> String {
        if self.hostname.contains(':') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Outcome of a successful check, ready for printing or serialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryReport {
    pub hostname: String,
    pub port: u16,
    /// `notAfter` exactly as the TLS library rendered it
    pub not_after: String,
    /// `notAfter` as RFC 3339
    pub expires_at: String,
    /// Negative once expired
    pub remaining_seconds: i64,
    /// Whole days left, truncated toward zero
    pub days_left: i64,
    pub is_expired: bool,
    /// Human-readable form of `remaining_seconds`
    pub remaining: String,
}

impl ExpiryReport {
    /// Builds a report for `target` from a raw `notAfter` string as seen at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpiryError::Parse`] if `not_after` is malformed.
    pub fn new(
        target: &Target,
        not_after: &str,
        now: DateTime<Utc>,
    ) -> Result<ExpiryReport, ExpiryError> {
        let expires_at = parse_not_after(not_after)?;
        let delta = time_remaining(expires_at, now);
        Ok(ExpiryReport {
            hostname: target.hostname.clone(),
            port: target.port,
            not_after: not_after.to_string(),
            expires_at: expires_at.to_rfc3339(),
            remaining_seconds: delta.num_seconds(),
            days_left: delta.num_days(),
            is_expired: delta < TimeDelta::zero(),
            remaining: format_remaining(delta),
        })
    }

    pub fn remaining_delta(&self) -> TimeDelta {
        TimeDelta::seconds(self.remaining_seconds)
    }
}

/// Performs certificate expiry checks. Holds only immutable settings, so one
/// checker can be shared across threads.
#[derive(Debug, Clone)]
pub struct ExpiryChecker {
    timeout: Duration,
}

impl Default for ExpiryChecker {
    fn default() -> Self {
        ExpiryChecker {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExpiryChecker {
    pub fn new() -> ExpiryChecker {
        ExpiryChecker::default()
    }

    /// Sets the bound applied to the TCP connect and to each handshake read/write.
    /// A zero duration means [`DEFAULT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> ExpiryChecker {
        self.timeout = if timeout.as_nanos() == 0 {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the time left until the certificate of `target` expires.
    ///
    /// # Errors
    ///
    /// One [`ExpiryError`] per failure class: resolution, refusal, timeout,
    /// TLS failure, missing certificate or unparseable expiry date.
    pub fn check(&self, target: &Target) -> Result<TimeDelta, ExpiryError> {
        let not_after = self.fetch_not_after(target)?;
        let expires_at = parse_not_after(&not_after)?;
        Ok(time_remaining(expires_at, Utc::now()))
    }

    /// Like [`ExpiryChecker::check`], returning a full [`ExpiryReport`].
    pub fn report(&self, target: &Target) -> Result<ExpiryReport, ExpiryError> {
        let not_after = self.fetch_not_after(target)?;
        ExpiryReport::new(target, &not_after, Utc::now())
    }

    /// Connects, handshakes and returns the leaf certificate's `notAfter`.
    fn fetch_not_after(&self, target: &Target) -> Result<String, ExpiryError> {
        let address = target.address();

        let addrs: Vec<SocketAddr> = (target.hostname.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|source| ExpiryError::NameResolution {
                hostname: target.hostname.clone(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(ExpiryError::NameResolution {
                hostname: target.hostname.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }
        debug!("{} resolved to {:?}", target.hostname, addrs);

        let stream = self.connect(&address, &addrs)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| ExpiryError::from_connect(&address, e))?;

        // Default verify paths, peer verification, SNI and hostname checking.
        let connector = SslConnector::builder(SslMethod::tls_client())?.build();
        let mut tls = connector
            .configure()?
            .connect(&target.hostname, stream)
            .map_err(|e| handshake_error(target, &address, e))?;
        debug!(
            "handshake with {} done: {} {}",
            address,
            tls.ssl().version_str(),
            tls.ssl()
                .current_cipher()
                .map(|c| c.name())
                .unwrap_or("unknown cipher")
        );

        let not_after = tls
            .ssl()
            .peer_certificate()
            .map(|cert| cert.not_after().to_string())
            .ok_or_else(|| ExpiryError::Certificate {
                reason: format!("{} presented no certificate", address),
            })?;

        if let Err(e) = tls.shutdown() {
            debug!("close_notify to {} failed: {}", address, e);
        }
        Ok(not_after)
    }

    fn connect(&self, address: &str, addrs: &[SocketAddr]) -> Result<TcpStream, ExpiryError> {
        let mut last_error = None;
        for addr in addrs {
            debug!("connecting to {} ({})", address, addr);
            match TcpStream::connect_timeout(addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        let e = last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses to try"));
        Err(ExpiryError::from_connect(address, e))
    }
}

fn handshake_error(
    target: &Target,
    address: &str,
    e: HandshakeError<TcpStream>,
) -> ExpiryError {
    let timeout = || ExpiryError::Timeout {
        address: address.to_string(),
        operation: "handshake".to_string(),
    };
    match e {
        HandshakeError::SetupFailure(stack) => ExpiryError::Tls {
            hostname: target.hostname.clone(),
            reason: stack.to_string(),
        },
        HandshakeError::WouldBlock(_) => timeout(),
        HandshakeError::Failure(mid) => {
            let timed_out = mid.error().io_error().map_or(false, |io| {
                matches!(
                    io.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                )
            });
            if timed_out {
                return timeout();
            }
            let verify = mid.ssl().verify_result();
            let reason = if verify == X509VerifyResult::OK {
                mid.error().to_string()
            } else {
                format!("{} ({})", mid.error(), verify.error_string())
            };
            ExpiryError::Tls {
                hostname: target.hostname.clone(),
                reason,
            }
        }
    }
}

/// Checks `hostname:port` with the default checker.
///
/// The port is range-checked before any network I/O.
pub fn check(hostname: &str, port: i64) -> Result<TimeDelta, ExpiryError> {
    let target = Target::new(hostname, port)?;
    ExpiryChecker::new().check(&target)
}
