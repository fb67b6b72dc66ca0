//! Connection options for the FTP backend.

use serde::{Deserialize, Serialize};

/// Security mode for the control channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FtpSecurity {
    /// Plain-text FTP (port 21).
    #[default]
    None,
    /// Explicit FTPS: starts plain, then upgrades via AUTH TLS (port 21).
    Explicit,
    /// Implicit FTPS: TLS from the first byte (port 990).
    Implicit,
}

impl FtpSecurity {
    pub fn default_port(self) -> u16 {
        match self {
            FtpSecurity::Implicit => 990,
            _ => 21,
        }
    }

    pub fn is_secure(self) -> bool {
        self != FtpSecurity::None
    }
}

/// Everything the FTP transport needs to open and authenticate a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FtpOptions {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub security: FtpSecurity,
    /// Accept self-signed / untrusted certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// TCP connect timeout in seconds. With implicit TLS it does not cover
    /// the TLS handshake.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    21
}
fn default_username() -> String {
    "anonymous".into()
}
fn default_connect_timeout() -> u64 {
    15
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            security: FtpSecurity::None,
            accept_invalid_certs: false,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}
