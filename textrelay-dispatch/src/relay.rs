use std::{fmt, net::IpAddr};

use serde::{Deserialize, Serialize};

/// Login details for one outbound relay account.
///
/// The JSON form uses the names operators type into the web form:
/// `host, port, username, password, from, enabled`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCredential {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "password", default)]
    pub secret: String,
    #[serde(rename = "from")]
    pub sender: String,
    #[serde(default)]
    pub enabled: bool,
}

impl RelayCredential {
    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Whether the relay runs on this machine, where credentials may be sent
    /// without TLS.
    pub fn is_loopback(&self) -> bool {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        host.eq_ignore_ascii_case("localhost")
            || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

impl fmt::Debug for RelayCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCredential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &crate::REDACTED)
            .field("sender", &self.sender)
            .field("enabled", &self.enabled)
            .finish()
    }
}
