use crate::error::{NetconfClientError, NetconfClientResult};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NETCONF_PORT: u16 = 830;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the SSH user authenticates; exactly one method per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Password(String),
    PrivateKey {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub authentication: Authentication,
    pub connect_timeout: Duration,
}

impl SessionConfig {
    pub fn new(address: &str, username: &str, authentication: Authentication) -> SessionConfig {
        SessionConfig {
            address: address.to_string(),
            port: DEFAULT_NETCONF_PORT,
            username: username.to_string(),
            authentication,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Accepts `host` or `host:port`.
    pub fn from_host(
        host: &str,
        username: &str,
        authentication: Authentication,
    ) -> NetconfClientResult<SessionConfig> {
        let (address, port) = split_host(host)?;
        Ok(SessionConfig::new(address, username, authentication).with_port(port))
    }

    pub fn with_port(mut self, port: u16) -> SessionConfig {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> SessionConfig {
        self.connect_timeout = timeout;
        self
    }
}

/// `timeout` in milliseconds as libssh2 expects it, saturating at `u32::MAX`.
pub fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

/// Splits `host[:port]`, defaulting to the NETCONF over SSH port.
pub fn split_host(host: &str) -> NetconfClientResult<(&str, u16)> {
    match host.rsplit_once(':') {
        Some((address, port)) if !address.contains(':') => {
            let port = port
                .parse()
                .map_err(|_| NetconfClientError::new(format!("invalid port in {:?}", host)))?;
            Ok((address, port))
        }
        _ => Ok((host, DEFAULT_NETCONF_PORT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_host() {
        let auth = Authentication::Password("secret".to_string());
        let config = SessionConfig::from_host("router1", "admin", auth.clone()).unwrap();
        assert_eq!(config.address, "router1");
        assert_eq!(config.port, 830);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));

        let config = SessionConfig::from_host("10.0.0.1:2022", "admin", auth.clone()).unwrap();
        assert_eq!(config.address, "10.0.0.1");
        assert_eq!(config.port, 2022);

        assert!(SessionConfig::from_host("10.0.0.1:ssh", "admin", auth).is_err());
    }

    #[test]
    fn test_timeout_millis_saturates() {
        assert_eq!(timeout_millis(DEFAULT_CONNECT_TIMEOUT), 10_000);
        assert_eq!(timeout_millis(Duration::from_secs(50 * 24 * 3600)), u32::MAX);
    }

    #[test]
    fn test_split_host_ipv6() {
        assert_eq!(split_host("::1").unwrap(), ("::1", 830));
    }
}
