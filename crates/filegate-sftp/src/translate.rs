//! SSH / SFTP failures → shared error taxonomy.

use crate::error::{
    SftpError, FX_CONNECTION_LOST, FX_NO_CONNECTION, FX_NO_SUCH_FILE, FX_NO_SUCH_PATH,
    FX_PERMISSION_DENIED,
};
use filegate_core::{Error, ErrorKind, Operation};
use ssh2::ErrorCode;

// libssh2 session error codes (LIBSSH2_ERROR_*).
const BANNER_RECV: i32 = -2;
const BANNER_SEND: i32 = -3;
const KEX_FAILURE: i32 = -5;
const SOCKET_SEND: i32 = -7;
const KEY_EXCHANGE_FAILURE: i32 = -8;
const TIMEOUT: i32 = -9;
const SOCKET_DISCONNECT: i32 = -13;
const AUTHENTICATION_FAILED: i32 = -18;
const PUBLICKEY_UNVERIFIED: i32 = -19;
const SOCKET_RECV: i32 = -43;

fn classify(err: &SftpError) -> ErrorKind {
    match err {
        SftpError::Io(_) | SftpError::NotConnected | SftpError::HostKeyMismatch { .. } => {
            ErrorKind::Connection
        }
        SftpError::AuthRejected(_) => ErrorKind::Authentication,
        SftpError::Ssh(e) => match e.code() {
            ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH) => {
                ErrorKind::PathNotFound
            }
            ErrorCode::SFTP(FX_PERMISSION_DENIED) => ErrorKind::PermissionDenied,
            ErrorCode::SFTP(FX_NO_CONNECTION) | ErrorCode::SFTP(FX_CONNECTION_LOST) => {
                ErrorKind::Connection
            }
            ErrorCode::Session(AUTHENTICATION_FAILED) | ErrorCode::Session(PUBLICKEY_UNVERIFIED) => {
                ErrorKind::Authentication
            }
            ErrorCode::Session(
                BANNER_RECV | BANNER_SEND | KEX_FAILURE | SOCKET_SEND | KEY_EXCHANGE_FAILURE
                | TIMEOUT | SOCKET_DISCONNECT | SOCKET_RECV,
            ) => ErrorKind::Connection,
            _ => ErrorKind::GenericProtocol,
        },
    }
}

/// Translate a transport error raised while performing `op` on `path`.
pub fn translate(err: SftpError, op: Operation, path: Option<&str>) -> Error {
    let kind = classify(&err);
    let message = match path {
        Some(p) => format!("{} '{}' failed: {}", op, p, err),
        None => format!("{} failed: {}", op, err),
    };
    let mut out = Error::new(kind, message).with_operation(op);
    if let Some(p) = path {
        out = out.with_path(p);
    }
    out.with_source(err)
}

pub(crate) fn at(op: Operation, path: &str) -> impl FnOnce(SftpError) -> Error + '_ {
    move |e| translate(e, op, Some(path))
}
