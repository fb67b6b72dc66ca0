//! Connection configuration for [`crate::Client`].

use filegate_ftp::{FtpOptions, FtpSecurity};
use filegate_sftp::SftpOptions;
use serde::{Deserialize, Serialize};

/// Remote protocol family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Protocol {
    /// Same as `Ftp`.
    #[default]
    Default,
    Ftp,
    /// FTP over TLS.
    Ftps,
    /// SSH file transfer; `encryption` is ignored.
    Sftp,
}

/// FTP-family encryption mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Encryption {
    #[default]
    None,
    Implicit,
    Explicit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub host: String,
    /// Defaults by protocol: 21, 990 for implicit FTPS, 22 for SFTP.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Connect while constructing the client.
    #[serde(default)]
    pub connect_immediately: bool,
    /// Folder to enter after every successful connect.
    #[serde(default)]
    pub remote_folder: Option<String>,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub encryption: Encryption,
    /// SFTP host key fingerprint to pin.
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Skip certificate validation for FTPS. Unset means "yes for `Ftps`".
    #[serde(default)]
    pub accept_invalid_certs: Option<bool>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    30
}

impl ConnectionConfig {
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            connect_immediately: false,
            remote_folder: None,
            protocol,
            encryption: Encryption::None,
            fingerprint: None,
            accept_invalid_certs: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn with_remote_folder(mut self, folder: impl Into<String>) -> Self {
        self.remote_folder = Some(folder.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn connect_immediately(mut self, yes: bool) -> Self {
        self.connect_immediately = yes;
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Control-channel security derived from protocol and encryption.
    ///
    /// `Ftps` without an explicit mode upgrades with AUTH TLS.
    pub fn ftp_security(&self) -> FtpSecurity {
        match (self.protocol, self.encryption) {
            (_, Encryption::Implicit) => FtpSecurity::Implicit,
            (_, Encryption::Explicit) | (Protocol::Ftps, Encryption::None) => FtpSecurity::Explicit,
            _ => FtpSecurity::None,
        }
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match self.protocol {
            Protocol::Sftp => 22,
            _ => self.ftp_security().default_port(),
        })
    }

    pub fn ftp_options(&self) -> FtpOptions {
        FtpOptions {
            host: self.host.clone(),
            port: self.effective_port(),
            username: self.username.clone(),
            password: self.password.clone(),
            security: self.ftp_security(),
            accept_invalid_certs: self
                .accept_invalid_certs
                .unwrap_or(self.protocol == Protocol::Ftps),
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }

    pub fn sftp_options(&self) -> SftpOptions {
        SftpOptions {
            host: self.host.clone(),
            port: self.effective_port(),
            username: self.username.clone(),
            password: self.password.clone(),
            fingerprint: self.fingerprint.clone().filter(|f| !f.trim().is_empty()),
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        let ftp = ConnectionConfig::new(Protocol::Default, "h", "u", "p");
        assert_eq!(ftp.effective_port(), 21);
        let implicit = ftp.clone().with_encryption(Encryption::Implicit);
        assert_eq!(implicit.effective_port(), 990);
        let sftp = ConnectionConfig::new(Protocol::Sftp, "h", "u", "p");
        assert_eq!(sftp.effective_port(), 22);
        assert_eq!(sftp.clone().with_port(2222).effective_port(), 2222);
    }

    #[test]
    fn test_security_mapping() {
        let cfg = |p, e| ConnectionConfig::new(p, "h", "u", "p").with_encryption(e);
        assert_eq!(cfg(Protocol::Ftp, Encryption::None).ftp_security(), FtpSecurity::None);
        assert_eq!(cfg(Protocol::Ftps, Encryption::None).ftp_security(), FtpSecurity::Explicit);
        assert_eq!(cfg(Protocol::Ftps, Encryption::Implicit).ftp_security(), FtpSecurity::Implicit);
        assert_eq!(cfg(Protocol::Default, Encryption::Explicit).ftp_security(), FtpSecurity::Explicit);
    }

    #[test]
    fn test_certificate_trust_follows_protocol() {
        let ftps = ConnectionConfig::new(Protocol::Ftps, "h", "u", "p");
        assert!(ftps.ftp_options().accept_invalid_certs);
        let ftp = ConnectionConfig::new(Protocol::Ftp, "h", "u", "p");
        assert!(!ftp.ftp_options().accept_invalid_certs);
        let strict = ConnectionConfig {
            accept_invalid_certs: Some(false),
            ..ftps
        };
        assert!(!strict.ftp_options().accept_invalid_certs);
    }

    #[test]
    fn test_json_camel_case_and_defaults() {
        let cfg = ConnectionConfig::from_json(
            r#"{
                "host": "files.example.org",
                "username": "deploy",
                "password": "pw",
                "protocol": "sftp",
                "remoteFolder": "/incoming",
                "fingerprint": "SHA256:abc",
                "connectImmediately": true
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.protocol, Protocol::Sftp);
        assert_eq!(cfg.encryption, Encryption::None);
        assert_eq!(cfg.remote_folder.as_deref(), Some("/incoming"));
        assert!(cfg.connect_immediately);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.sftp_options().port, 22);

        let back = ConnectionConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_blank_fingerprint_is_no_pin() {
        let cfg = ConnectionConfig::new(Protocol::Sftp, "h", "u", "p").with_fingerprint("  ");
        assert_eq!(cfg.sftp_options().fingerprint, None);
    }
}
