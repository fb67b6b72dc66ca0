//! Transport-level FTP error.
//!
//! Everything the `suppaftp` layer can fail with is folded into one
//! `FtpError` carrying the reply code when the server sent one. The adapter
//! translates it into the shared taxonomy in [`crate::translate`].

use std::fmt;

/// Categorised FTP failure.
#[derive(Debug)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub code: Option<u16>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// TCP / DNS resolution failure.
    ConnectionFailed,
    /// AUTH TLS / TLS handshake failure.
    TlsFailed,
    /// Wrong username/password.
    AuthFailed,
    /// Server returned a 4xx/5xx for a command.
    CommandRejected,
    /// Data channel could not be established or broke mid-transfer.
    TransferFailed,
    /// Server sent a reply we could not make sense of.
    ProtocolError,
    /// Control connection dropped (421 or closed socket).
    Disconnected,
    PermissionDenied,
    NotFound,
    Timeout,
    /// Operation issued before `connect`.
    NotConnected,
}

pub type FtpResult<T> = Result<T, FtpError>;

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ConnectionFailed, msg)
    }

    pub fn tls_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::TlsFailed, msg)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ProtocolError, msg)
    }

    pub fn not_connected() -> Self {
        Self::new(FtpErrorKind::NotConnected, "no FTP control connection")
    }

    /// Classify an FTP reply code into the most appropriate error kind.
    pub fn from_reply(code: u16, text: &str) -> Self {
        let kind = match code {
            421 => FtpErrorKind::Disconnected,
            425 | 426 => FtpErrorKind::TransferFailed,
            430 | 530 => FtpErrorKind::AuthFailed,
            450 | 550 => {
                let lower = text.to_lowercase();
                if lower.contains("permission") || lower.contains("denied") {
                    FtpErrorKind::PermissionDenied
                } else if lower.contains("not found")
                    || lower.contains("no such")
                    || lower.contains("does not exist")
                {
                    FtpErrorKind::NotFound
                } else {
                    FtpErrorKind::CommandRejected
                }
            }
            451 | 452 | 552 => FtpErrorKind::TransferFailed,
            _ if code >= 400 => FtpErrorKind::CommandRejected,
            _ => FtpErrorKind::ProtocolError,
        };
        Self::new(kind, text.trim()).with_code(code)
    }

    /// A "file unavailable" style reply: the path is missing or unusable.
    ///
    /// Servers disagree on the wording of 550 for missing paths, so existence
    /// probes treat every 450/550 as "not there".
    pub fn is_unavailable(&self) -> bool {
        self.kind == FtpErrorKind::NotFound || matches!(self.code, Some(450) | Some(550))
    }

    /// The server does not implement the command (500, 501, 502, 504).
    pub fn is_unsupported_command(&self) -> bool {
        matches!(self.code, Some(500) | Some(501) | Some(502) | Some(504))
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[FTP {:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[FTP {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        let kind = match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => FtpErrorKind::Timeout,
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => FtpErrorKind::Disconnected,
            _ => FtpErrorKind::ConnectionFailed,
        };
        Self::new(kind, e.to_string()).with_source(e)
    }
}

impl From<native_tls::Error> for FtpError {
    fn from(e: native_tls::Error) -> Self {
        Self::tls_failed(e.to_string()).with_source(e)
    }
}

impl From<suppaftp::FtpError> for FtpError {
    fn from(e: suppaftp::FtpError) -> Self {
        match e {
            suppaftp::FtpError::ConnectionError(io) => io.into(),
            suppaftp::FtpError::SecureError(msg) => Self::tls_failed(msg),
            suppaftp::FtpError::UnexpectedResponse(response) => {
                let code = response.status.code() as u16;
                let text = String::from_utf8_lossy(&response.body).into_owned();
                Self::from_reply(code, &text)
            }
            other => Self::protocol_error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_classification() {
        assert_eq!(FtpError::from_reply(530, "Login incorrect.").kind, FtpErrorKind::AuthFailed);
        assert_eq!(FtpError::from_reply(421, "Timeout.").kind, FtpErrorKind::Disconnected);
        assert_eq!(
            FtpError::from_reply(550, "/x: No such file or directory").kind,
            FtpErrorKind::NotFound
        );
        assert_eq!(
            FtpError::from_reply(550, "Permission denied.").kind,
            FtpErrorKind::PermissionDenied
        );
        assert_eq!(
            FtpError::from_reply(550, "Could not get file size.").kind,
            FtpErrorKind::CommandRejected
        );
        assert_eq!(FtpError::from_reply(500, "Unknown command").kind, FtpErrorKind::CommandRejected);
    }

    #[test]
    fn test_unavailable_covers_vague_550() {
        assert!(FtpError::from_reply(550, "Could not get file size.").is_unavailable());
        assert!(FtpError::from_reply(450, "busy").is_unavailable());
        assert!(!FtpError::from_reply(530, "Login incorrect.").is_unavailable());
    }

    #[test]
    fn test_unsupported_command_replies() {
        assert!(FtpError::from_reply(502, "Command not implemented.").is_unsupported_command());
        assert!(FtpError::from_reply(500, "MLSD not understood").is_unsupported_command());
        assert!(!FtpError::from_reply(550, "No such directory").is_unsupported_command());
        assert!(!FtpError::connection_failed("reset").is_unsupported_command());
    }

    #[test]
    fn test_io_error_kinds() {
        let reset: FtpError = std::io::Error::from(std::io::ErrorKind::ConnectionReset).into();
        assert_eq!(reset.kind, FtpErrorKind::Disconnected);
        let refused: FtpError = std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into();
        assert_eq!(refused.kind, FtpErrorKind::ConnectionFailed);
        assert!(std::error::Error::source(&refused).is_some());
    }

    #[test]
    fn test_display_includes_code() {
        let e = FtpError::from_reply(550, "File not found");
        assert_eq!(e.to_string(), "[FTP NotFound 550] File not found");
    }
}
