//! # filegate – SFTP backend
//!
//! `SftpAdapter` implements the shared `ProtocolAdapter` contract over a
//! blocking libssh2 session (`ssh2` crate):
//!   • Password auth with keyboard-interactive fallback
//!   • Optional host key fingerprint pinning (MD5 / SHA-1 / SHA-256)
//!   • Client-side working directory tracking
//!   • SSH session and SFTP status codes mapped onto the shared taxonomy

pub mod adapter;
pub mod error;
pub mod fingerprint;
pub mod options;
pub mod translate;
pub mod transport;

pub use adapter::SftpAdapter;
pub use error::{SftpError, SftpResult};
pub use fingerprint::{Fingerprint, HashKind};
pub use options::SftpOptions;
pub use transport::{RemoteStat, SftpTransport, Ssh2Transport};
