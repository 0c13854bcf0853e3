//! Hostname clean-up and `host[:port]` handling.
//!
//! Users paste all sorts of things as a "host": full URLs, `user@host`,
//! `host:8443`, bracketed IPv6 literals. These helpers reduce such input to
//! a bare hostname and an optional port. They are pure string functions and
//! never touch the network.

use std::convert::TryFrom;

use url::Host;

use crate::error::ExpiryError;

/// Port used when a target does not name one.
pub const DEFAULT_PORT: u16 = 443;

/// Reduces user input to a bare, lowercase hostname.
///
/// Strips a `scheme://` prefix, userinfo, path, query, fragment, a trailing
/// `:port` and a trailing dot. International domain names are converted to
/// their ASCII form. Bracketed IPv6 literals lose their brackets.
///
/// ```
/// use certexpiry::clean_hostname;
///
/// assert_eq!(clean_hostname("https://Example.COM:8443/path?q=1"), "example.com");
/// assert_eq!(clean_hostname("[::1]:443"), "::1");
/// ```
pub fn clean_hostname(input: &str) -> String {
    let (host, _) = split_authority(authority_of(input));
    normalize(host)
}

/// Splits `host[:port]` (optionally a full URL) into a cleaned hostname and
/// the explicit port, if any.
///
/// # Errors
///
/// * [`ExpiryError::InvalidInput`] if no hostname remains or the port is not a number
/// * [`ExpiryError::InvalidPort`] if the port is outside 1..=65535
pub fn split_host_port(input: &str) -> Result<(String, Option<u16>), ExpiryError> {
    let (host, port) = split_authority(authority_of(input));

    let port = match port {
        Some(raw) => Some(parse_port(raw)?),
        None => None,
    };

    let host = normalize(host);
    if host.is_empty() {
        return Err(ExpiryError::InvalidInput {
            field: "hostname".to_string(),
            reason: format!("no hostname in '{}'", input.trim()),
        });
    }

    Ok((host, port))
}

/// Range-checks a port number.
///
/// # Errors
///
/// Returns [`ExpiryError::InvalidPort`] for values outside 1..=65535.
pub fn validate_port(port: i64) -> Result<u16, ExpiryError> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ExpiryError::InvalidPort { port }),
    }
}

/// Checks that `hostname` is non-empty and syntactically a hostname or IP.
pub(crate) fn validate_hostname(hostname: &str) -> Result<(), ExpiryError> {
    if hostname.is_empty() {
        return Err(ExpiryError::InvalidInput {
            field: "hostname".to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    let candidate = if hostname.contains(':') {
        format!("[{}]", hostname)
    } else {
        hostname.to_string()
    };
    Host::parse(&candidate)
        .map(|_| ())
        .map_err(|e| ExpiryError::InvalidInput {
            field: "hostname".to_string(),
            reason: format!("'{}': {}", hostname, e),
        })
}

fn parse_port(raw: &str) -> Result<u16, ExpiryError> {
    let port = raw
        .parse::<i64>()
        .map_err(|_| ExpiryError::InvalidInput {
            field: "port".to_string(),
            reason: format!("'{}' is not a number", raw),
        })?;
    validate_port(port)
}

/// The `[userinfo@]host[:port]` part of the input.
fn authority_of(input: &str) -> &str {
    let s = input.trim();
    let s = s.split_once("://").map_or(s, |(_, rest)| rest);
    let s = s.split(&['/', '?', '#'][..]).next().unwrap_or(s);
    s.rsplit_once('@').map_or(s, |(_, host)| host)
}

fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if let Some(rest) = authority.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => (rest, None),
        };
    }
    // A bare IPv6 literal has several colons and no port.
    match authority.split_once(':') {
        Some((host, port)) if !port.contains(':') => (host, Some(port)),
        _ => (authority, None),
    }
}

fn normalize(host: &str) -> String {
    let host = host.trim_end_matches('.');
    let candidate = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    match Host::parse(&candidate) {
        Ok(Host::Domain(domain)) => domain,
        Ok(Host::Ipv4(ip)) => ip.to_string(),
        Ok(Host::Ipv6(ip)) => ip.to_string(),
        Err(_) => host.to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_clean_plain() {
        assert_eq!(clean_hostname("example.com"), "example.com");
        assert_eq!(clean_hostname("  Example.COM  "), "example.com");
        assert_eq!(clean_hostname("example.com."), "example.com");
    }

    #[test]
    fn test_clean_url_parts() {
        assert_eq!(clean_hostname("https://example.com"), "example.com");
        assert_eq!(clean_hostname("http://example.com/a/b"), "example.com");
        assert_eq!(clean_hostname("example.com/path"), "example.com");
        assert_eq!(clean_hostname("example.com:8443"), "example.com");
        assert_eq!(clean_hostname("https://user:pw@example.com:443/x?y#z"), "example.com");
        assert_eq!(clean_hostname("ldaps://ldap.example.org:636"), "ldap.example.org");
    }

    #[test]
    fn test_clean_ip_literals() {
        assert_eq!(clean_hostname("127.0.0.1:443"), "127.0.0.1");
        assert_eq!(clean_hostname("[2001:db8::1]:8443"), "2001:db8::1");
        assert_eq!(clean_hostname("2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn test_clean_idn() {
        assert_eq!(clean_hostname("bücher.example"), "xn--bcher-kva.example");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("example.com").unwrap(),
            ("example.com".to_string(), None)
        );
        assert_eq!(
            split_host_port("example.com:8443").unwrap(),
            ("example.com".to_string(), Some(8443))
        );
        assert_eq!(
            split_host_port("https://example.com:9443/health").unwrap(),
            ("example.com".to_string(), Some(9443))
        );
        assert_eq!(
            split_host_port("[::1]:8443").unwrap(),
            ("::1".to_string(), Some(8443))
        );
    }

    #[test]
    fn test_split_host_port_errors() {
        assert_eq!(
            split_host_port("example.com:0").unwrap_err().kind(),
            ErrorKind::InvalidPort
        );
        assert_eq!(
            split_host_port("example.com:70000").unwrap_err().kind(),
            ErrorKind::InvalidPort
        );
        assert_eq!(
            split_host_port("example.com:https").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            split_host_port("https://").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_validate_port_bounds() {
        assert_eq!(validate_port(1).unwrap(), 1);
        assert_eq!(validate_port(443).unwrap(), 443);
        assert_eq!(validate_port(65535).unwrap(), 65535);
        for bad in [0, -1, 65536, i64::MAX].iter() {
            match validate_port(*bad) {
                Err(ExpiryError::InvalidPort { port }) => assert_eq!(port, *bad),
                other => panic!("expected InvalidPort for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_validate_hostname() {
        assert!(validate_hostname("example.com").is_ok());
        assert!(validate_hostname("10.0.0.1").is_ok());
        assert!(validate_hostname("::1").is_ok());
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("exa mple.com").is_err());
    }
}
