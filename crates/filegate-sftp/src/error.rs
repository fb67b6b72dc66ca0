//! Transport-level SFTP error.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SftpError {
    /// TCP connect or local stream I/O failed.
    Io(io::Error),
    /// libssh2 session or SFTP status failure.
    Ssh(ssh2::Error),
    /// Neither password nor keyboard-interactive auth was accepted.
    AuthRejected(String),
    /// Presented host key does not hash to the pinned fingerprint.
    HostKeyMismatch { expected: String, presented: String },
    /// Command issued before the session was opened.
    NotConnected,
}

pub type SftpResult<T> = Result<T, SftpError>;

// libssh2 SFTP status codes (LIBSSH2_FX_*).
pub(crate) const FX_NO_SUCH_FILE: i32 = 2;
pub(crate) const FX_PERMISSION_DENIED: i32 = 3;
pub(crate) const FX_NO_CONNECTION: i32 = 6;
pub(crate) const FX_CONNECTION_LOST: i32 = 7;
pub(crate) const FX_NO_SUCH_PATH: i32 = 10;

impl SftpError {
    /// The server says the path does not exist.
    pub fn is_missing(&self) -> bool {
        match self {
            SftpError::Ssh(e) => matches!(
                e.code(),
                ssh2::ErrorCode::SFTP(FX_NO_SUCH_FILE) | ssh2::ErrorCode::SFTP(FX_NO_SUCH_PATH)
            ),
            _ => false,
        }
    }
}

impl fmt::Display for SftpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SftpError::Io(e) => write!(f, "[SFTP io] {}", e),
            SftpError::Ssh(e) => write!(f, "[SFTP {:?}] {}", e.code(), e.message()),
            SftpError::AuthRejected(msg) => write!(f, "[SFTP auth] {}", msg),
            SftpError::HostKeyMismatch { expected, presented } => write!(
                f,
                "[SFTP host key] expected {}, server presented {}",
                expected, presented
            ),
            SftpError::NotConnected => f.write_str("[SFTP] no session"),
        }
    }
}

impl std::error::Error for SftpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SftpError::Io(e) => Some(e),
            SftpError::Ssh(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SftpError {
    fn from(e: io::Error) -> Self {
        SftpError::Io(e)
    }
}

impl From<ssh2::Error> for SftpError {
    fn from(e: ssh2::Error) -> Self {
        SftpError::Ssh(e)
    }
}
