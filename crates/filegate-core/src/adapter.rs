//! The capability set every protocol backend exposes.
//!
//! Backends implement the required methods by delegating to their
//! transport library. The provided methods hold the behaviour that must be
//! identical across backends (local file handling, copy and move), so a
//! backend only overrides them when its transport can do better.

use crate::entry::RemoteEntry;
use crate::error::{Operation, Result};
use crate::verify;
use log::info;
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// Primitive remote calls used by the shared folder and verification
/// routines in [`crate::folders`] and [`crate::verify`].
pub trait RemoteOps {
    /// Direct children of `path`, `parent` set to `path`.
    fn entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;
    fn remove_file(&mut self, path: &str) -> Result<()>;
    /// Remove an empty directory.
    fn remove_dir(&mut self, path: &str) -> Result<()>;
    /// Create one directory level.
    fn make_dir(&mut self, path: &str) -> Result<()>;
    fn dir_exists(&mut self, path: &str) -> Result<bool>;
    /// Size of a remote file, `None` when it does not exist.
    fn remote_size(&mut self, path: &str) -> Result<Option<u64>>;
}

/// Uniform operation set over FTP, FTPS and SFTP.
pub trait ProtocolAdapter {
    // ── Connection ───────────────────────────────────────────────

    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
    fn is_connected(&self) -> bool;

    // ── Files ────────────────────────────────────────────────────

    /// Delete a remote file; `true` once it is gone.
    fn delete_file(&mut self, path: &str) -> Result<bool>;

    /// Stream a remote file into `sink`, verifying the byte count against
    /// the server-reported size. The remote file is deleted afterwards only
    /// when `delete_source` is set and verification passed.
    fn download_to(&mut self, remote: &str, sink: &mut dyn Write, delete_source: bool)
        -> Result<bool>;

    /// Upload everything `source` yields to `remote`, verifying the
    /// destination size. A failed check removes the destination and
    /// returns `Ok(false)`.
    fn upload_from(&mut self, source: &mut dyn Read, remote: &str) -> Result<bool>;

    fn rename_file(&mut self, from: &str, to: &str) -> Result<bool>;
    fn file_exists(&mut self, path: &str) -> Result<bool>;

    // ── Folders ──────────────────────────────────────────────────

    /// Entries of `path`, or of the working directory when `None`.
    fn list_entries(&mut self, path: Option<&str>) -> Result<Vec<RemoteEntry>>;

    /// Create `path` and every missing parent.
    fn create_folder(&mut self, path: &str) -> Result<bool>;
    fn delete_folder(&mut self, path: &str, recursive: bool) -> Result<bool>;
    fn folder_exists(&mut self, path: &str) -> Result<bool>;
    fn set_working_directory(&mut self, path: &str) -> Result<()>;
    fn working_directory(&mut self) -> Result<String>;

    // ── Provided ─────────────────────────────────────────────────

    /// Download `remote` into a local file, removing that file again when
    /// the transfer or its verification fails.
    fn download_file(&mut self, remote: &str, local: &Path, delete_source: bool) -> Result<bool> {
        verify::download_into_file(local, |sink| self.download_to(remote, sink, delete_source))
    }

    /// Upload a local file. The local file is deleted only after a verified
    /// upload and only when `delete_source` is set.
    fn upload_file(&mut self, local: &Path, remote: &str, delete_source: bool) -> Result<bool> {
        let mut file = verify::open_local(local)?;
        let uploaded = self.upload_from(&mut file, remote)?;
        drop(file);

        if uploaded && delete_source {
            verify::remove_local(local, Operation::Upload)?;
            info!("removed local source {}", local.display());
        }
        Ok(uploaded)
    }

    fn list_files(&mut self, path: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .list_entries(path)?
            .into_iter()
            .filter(|e| e.is_file())
            .map(|e| e.name)
            .collect())
    }

    fn list_folders(&mut self, path: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .list_entries(path)?
            .into_iter()
            .filter(|e| e.is_dir() && !e.is_pseudo())
            .map(|e| e.name)
            .collect())
    }

    /// Server-side copy through a memory buffer; the upload half is verified.
    fn copy_file(&mut self, from: &str, to: &str) -> Result<bool> {
        if !self.file_exists(from)? {
            return Ok(false);
        }
        let mut buffer = Vec::new();
        self.download_to(from, &mut buffer, false)?;
        let copied = self.upload_from(&mut Cursor::new(buffer), to)?;
        if copied {
            info!("copied {} → {}", from, to);
        }
        Ok(copied)
    }

    /// Move a file by renaming it; `false` when the source does not exist.
    fn move_file(&mut self, from: &str, to: &str) -> Result<bool> {
        if !self.file_exists(from)? {
            return Ok(false);
        }
        self.rename_file(from, to)
    }
}
