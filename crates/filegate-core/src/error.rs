//! Unified error taxonomy shared by every backend.
//!
//! Adapters translate each backend failure into exactly one [`ErrorKind`]
//! before it leaves the adapter, keeping the original error reachable via
//! [`std::error::Error::source`].

use serde::{Deserialize, Serialize};
use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Categorised filegate error.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// Operation that was running when the failure happened.
    pub operation: Option<Operation>,
    /// Remote or local path the operation was working on.
    pub path: Option<String>,
    source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Transport-level connectivity failure (TCP, TLS, SSH handshake, dropped link).
    Connection,
    /// Credentials rejected during connect.
    Authentication,
    /// Remote path does not exist.
    PathNotFound,
    /// Server refused the operation for lack of rights.
    PermissionDenied,
    /// Non-recursive delete of a folder that still has entries.
    FolderNotEmpty,
    /// Transfer finished but failed size verification.
    OperationIncomplete,
    /// Operation attempted while the client is not connected.
    ClientDisconnected,
    /// Local side of a transfer failed (open, read, write, remove).
    LocalIo,
    /// Catch-all for any other backend failure.
    GenericProtocol,
}

/// Operation names attached to errors and log lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Connect,
    Disconnect,
    Delete,
    Download,
    Upload,
    ListFiles,
    ListFolders,
    Rename,
    Copy,
    Move,
    CreateFolder,
    DeleteFolder,
    ChangeDirectory,
    CurrentDirectory,
    Exists,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Delete => "delete",
            Operation::Download => "download",
            Operation::Upload => "upload",
            Operation::ListFiles => "list files",
            Operation::ListFolders => "list folders",
            Operation::Rename => "rename",
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::CreateFolder => "create folder",
            Operation::DeleteFolder => "delete folder",
            Operation::ChangeDirectory => "change directory",
            Operation::CurrentDirectory => "current directory",
            Operation::Exists => "exists",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Construction helpers ─────────────────────────────────────────────

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            operation: None,
            path: None,
            source: None,
        }
    }

    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operation = Some(op);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, msg)
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, msg).with_operation(Operation::Connect)
    }

    pub fn path_not_found(op: Operation, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorKind::PathNotFound,
            format!("path '{}' not found during {}", path, op),
        )
        .with_operation(op)
        .with_path(path)
    }

    pub fn permission_denied(op: Operation, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorKind::PermissionDenied,
            format!("permission denied during {} of '{}'", op, path),
        )
        .with_operation(op)
        .with_path(path)
    }

    pub fn folder_not_empty(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorKind::FolderNotEmpty,
            format!("folder '{}' is not empty", path),
        )
        .with_operation(Operation::DeleteFolder)
        .with_path(path)
    }

    pub fn incomplete(op: Operation, file: impl Into<String>) -> Self {
        let file = file.into();
        Self::new(
            ErrorKind::OperationIncomplete,
            format!("{} of '{}' did not complete: size mismatch", op, file),
        )
        .with_operation(op)
        .with_path(file)
    }

    pub fn disconnected() -> Self {
        Self::new(ErrorKind::ClientDisconnected, "client is not connected")
    }

    pub fn local_io(op: Operation, path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        Self::new(
            ErrorKind::LocalIo,
            format!("local {} failure on '{}': {}", op, path, err),
        )
        .with_operation(op)
        .with_path(path)
        .with_source(err)
    }

    pub fn generic(op: Operation, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GenericProtocol, msg).with_operation(op)
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Some(op) => write!(f, "[{:?} {}] {}", self.kind, op, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
