//! # filegate
//!
//! A blocking file-transfer client with one surface over three protocols:
//!   • plain FTP and FTPS (implicit or explicit TLS) via `filegate-ftp`
//!   • SFTP with optional host key pinning via `filegate-sftp`
//!
//! Uploads and downloads are verified by byte count. A failed upload removes
//! the partial remote file; a failed download removes the partial local one.
//!
//! ```no_run
//! use filegate::{Client, ConnectionConfig, Protocol};
//!
//! let config = ConnectionConfig::new(Protocol::Sftp, "files.example.org", "deploy", "secret")
//!     .with_remote_folder("/incoming")
//!     .connect_immediately(true);
//! let mut client = Client::from_config(&config)?;
//! for name in client.files_list("*.csv")? {
//!     client.download_file(&name, format!("/tmp/{}", name), false)?;
//! }
//! # Ok::<(), filegate::Error>(())
//! ```

pub mod client;
pub mod config;

pub use client::Client;
pub use config::{ConnectionConfig, Encryption, Protocol};

pub use filegate_core::{EntryKind, Error, ErrorKind, Operation, ProtocolAdapter, RemoteEntry, Result};

pub use filegate_ftp as ftp;
pub use filegate_sftp as sftp;
