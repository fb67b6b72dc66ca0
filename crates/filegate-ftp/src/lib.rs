//! # filegate – FTP / FTPS backend
//!
//! `FtpAdapter` implements the shared `ProtocolAdapter` contract over a
//! blocking `suppaftp` control connection:
//!   • Plain FTP, Explicit FTPS (AUTH TLS) and Implicit FTPS
//!   • LIST / MLSD / IIS listing parser
//!   • Reply-code classification into the shared error taxonomy
//!
//! The transport sits behind the `FtpTransport` trait so the adapter can be
//! driven by an in-memory server in tests.

pub mod adapter;
pub mod error;
pub mod options;
pub mod parser;
pub mod tls;
pub mod translate;
pub mod transport;

pub use adapter::FtpAdapter;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use options::{FtpOptions, FtpSecurity};
pub use transport::{FtpTransport, SuppaTransport};
