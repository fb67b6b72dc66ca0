//! FTP failures → shared error taxonomy.

use crate::error::{FtpError, FtpErrorKind};
use filegate_core::{Error, ErrorKind, Operation};

/// Translate a transport error raised while performing `op` on `path`.
///
/// The original error is kept as the `source()` of the result.
pub fn translate(err: FtpError, op: Operation, path: Option<&str>) -> Error {
    let kind = match err.kind {
        FtpErrorKind::ConnectionFailed
        | FtpErrorKind::TlsFailed
        | FtpErrorKind::Disconnected
        | FtpErrorKind::Timeout
        | FtpErrorKind::NotConnected => ErrorKind::Connection,
        FtpErrorKind::AuthFailed => ErrorKind::Authentication,
        FtpErrorKind::NotFound => ErrorKind::PathNotFound,
        FtpErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        FtpErrorKind::CommandRejected
        | FtpErrorKind::TransferFailed
        | FtpErrorKind::ProtocolError => ErrorKind::GenericProtocol,
    };

    let message = match path {
        Some(p) => format!("{} '{}' failed: {}", op, p, err.message),
        None => format!("{} failed: {}", op, err.message),
    };
    let mut out = Error::new(kind, message).with_operation(op);
    if let Some(p) = path {
        out = out.with_path(p);
    }
    out.with_source(err)
}

/// Shorthand for `map_err` closures.
pub(crate) fn at(op: Operation, path: &str) -> impl FnOnce(FtpError) -> Error + '_ {
    move |e| translate(e, op, Some(path))
}
