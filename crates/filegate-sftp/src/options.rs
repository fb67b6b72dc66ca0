//! Connection options for the SFTP backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SftpOptions {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Pinned host key fingerprint: colon-separated hex (MD5, SHA-1 or
    /// SHA-256 by length) or OpenSSH `SHA256:<base64>`. `None` accepts any key.
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    22
}
fn default_timeout() -> u64 {
    30
}

impl Default for SftpOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            fingerprint: None,
            connect_timeout_secs: default_timeout(),
        }
    }
}
