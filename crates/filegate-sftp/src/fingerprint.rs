//! Host key fingerprint pinning.
//!
//! Accepted notations:
//! - colon-separated hex, `d4:1f:...` (16 bytes → MD5, 20 → SHA-1, 32 → SHA-256)
//! - OpenSSH style `SHA256:<base64>` (padding optional)
//! - `MD5:` prefixed colon hex as printed by `ssh-keygen -E md5`

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use std::fmt;

/// Hash algorithm a fingerprint was taken with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

impl HashKind {
    pub fn to_ssh2(self) -> ssh2::HashType {
        match self {
            HashKind::Md5 => ssh2::HashType::Md5,
            HashKind::Sha1 => ssh2::HashType::Sha1,
            HashKind::Sha256 => ssh2::HashType::Sha256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    kind: HashKind,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFingerprint(pub String);

impl fmt::Display for InvalidFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid host key fingerprint '{}'", self.0)
    }
}

impl std::error::Error for InvalidFingerprint {}

impl Fingerprint {
    pub fn parse(raw: &str) -> Result<Self, InvalidFingerprint> {
        let text = raw.trim();
        let invalid = || InvalidFingerprint(raw.to_string());

        if let Some(b64) = strip_prefix_ci(text, "SHA256:") {
            let trimmed = b64.trim_end_matches('=');
            let bytes = STANDARD_NO_PAD
                .decode(trimmed)
                .or_else(|_| STANDARD.decode(b64))
                .map_err(|_| invalid())?;
            if bytes.len() != 32 {
                return Err(invalid());
            }
            return Ok(Self {
                kind: HashKind::Sha256,
                bytes,
            });
        }

        let hex_part = strip_prefix_ci(text, "MD5:").unwrap_or(text);
        let compact: String = hex_part
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .collect();
        let bytes = hex::decode(compact).map_err(|_| invalid())?;
        let kind = match bytes.len() {
            16 => HashKind::Md5,
            20 => HashKind::Sha1,
            32 => HashKind::Sha256,
            _ => return Err(invalid()),
        };
        Ok(Self { kind, bytes })
    }

    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Byte-exact comparison against the hash of the presented key.
    pub fn matches(&self, presented: &[u8]) -> bool {
        self.bytes == presented
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            HashKind::Sha256 => write!(f, "SHA256:{}", STANDARD_NO_PAD.encode(&self.bytes)),
            _ => f.write_str(&colon_hex(&self.bytes)),
        }
    }
}

/// `aa:bb:cc` rendering used in log lines.
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
