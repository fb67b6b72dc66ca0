//! The session facade.
//!
//! A `Client` owns exactly one protocol adapter. Every operation apart from
//! `connect`, `set_current_folder` and `current_folder` checks the connection
//! first and fails with `ClientDisconnected` without touching the adapter.

use crate::config::{ConnectionConfig, Protocol};
use filegate_core::{path, Error, NameMatcher, Operation, ProtocolAdapter, Result};
use filegate_ftp::FtpAdapter;
use filegate_sftp::SftpAdapter;
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::path::Path;

type Adapter = dyn ProtocolAdapter + 'static;

pub struct Client {
    adapter: Option<Box<Adapter>>,
    remote_folder: Option<String>,
}

impl Client {
    /// Build the adapter for `config.protocol` and connect right away when
    /// `connect_immediately` is set.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let adapter: Box<Adapter> = match config.protocol {
            Protocol::Sftp => Box::new(SftpAdapter::new(config.sftp_options())),
            Protocol::Default | Protocol::Ftp | Protocol::Ftps => {
                Box::new(FtpAdapter::new(config.ftp_options()))
            }
        };
        debug!(
            "client for {}:{} using {:?}",
            config.host,
            config.effective_port(),
            config.protocol
        );

        let mut client = Self::with_adapter(adapter, config.remote_folder.clone());
        if config.connect_immediately {
            client.connect()?;
        }
        Ok(client)
    }

    /// Wrap an already constructed adapter.
    pub fn with_adapter(adapter: Box<Adapter>, remote_folder: Option<String>) -> Self {
        Self {
            adapter: Some(adapter),
            remote_folder: remote_folder.filter(|f| !f.trim().is_empty()),
        }
    }

    fn connected(&mut self, op: Operation) -> Result<&mut Adapter> {
        match self.adapter.as_deref_mut() {
            Some(adapter) if adapter.is_connected() => Ok(adapter),
            _ => Err(Error::disconnected().with_operation(op)),
        }
    }

    fn live(&mut self, op: Operation) -> Result<&mut Adapter> {
        self.adapter.as_deref_mut().ok_or_else(|| {
            Error::new(
                filegate_core::ErrorKind::ClientDisconnected,
                "client has been disposed",
            )
            .with_operation(op)
        })
    }

    // ── Connection ───────────────────────────────────────────────────

    /// Connect and enter the configured remote folder. No-op when connected.
    ///
    /// A folder that cannot be entered fails the whole connect and leaves
    /// the client disconnected.
    pub fn connect(&mut self) -> Result<()> {
        let folder = self.remote_folder.as_deref().map(path::normalize);
        let adapter = self.live(Operation::Connect)?;
        if adapter.is_connected() {
            return Ok(());
        }
        adapter.connect()?;
        if let Some(folder) = folder {
            if let Err(e) = adapter.set_working_directory(&folder) {
                if let Err(close) = adapter.disconnect() {
                    warn!("disconnect after failed folder change failed: {}", close);
                }
                return Err(e);
            }
            info!("entered remote folder {}", folder);
        }
        Ok(())
    }

    /// No-op when not connected.
    pub fn disconnect(&mut self) -> Result<()> {
        match self.adapter.as_deref_mut() {
            Some(adapter) if adapter.is_connected() => adapter.disconnect(),
            _ => Ok(()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.adapter.as_deref().map_or(false, |a| a.is_connected())
    }

    /// Disconnect and release the adapter. Safe to call repeatedly; the
    /// client is unusable afterwards.
    pub fn dispose(&mut self) {
        let Some(mut adapter) = self.adapter.take() else {
            return;
        };
        if adapter.is_connected() {
            if let Err(e) = adapter.disconnect() {
                warn!("disconnect during dispose failed: {}", e);
            }
        }
        drop(adapter);
        debug!("client disposed");
    }

    // ── Files ────────────────────────────────────────────────────────

    pub fn delete_file(&mut self, name: &str) -> Result<bool> {
        self.connected(Operation::Delete)?.delete_file(name)
    }

    /// Delete every file of the current folder whose name matches `pattern`.
    /// Returns how many were deleted; an empty pattern deletes nothing.
    pub fn delete_files(&mut self, pattern: &str) -> Result<usize> {
        let adapter = self.connected(Operation::Delete)?;
        if pattern.is_empty() {
            return Ok(0);
        }
        let matcher = compile(pattern, Operation::Delete)?;

        let mut deleted = 0;
        for name in matcher.filter(adapter.list_files(None)?) {
            if adapter.delete_file(&name)? {
                deleted += 1;
            }
        }
        info!("deleted {} file(s) matching '{}'", deleted, pattern);
        Ok(deleted)
    }

    pub fn download_file(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
        delete_after: bool,
    ) -> Result<bool> {
        self.connected(Operation::Download)?
            .download_file(remote, local.as_ref(), delete_after)
    }

    /// Download into a caller-owned writer, which is never closed or removed.
    pub fn download_to(
        &mut self,
        remote: &str,
        sink: &mut dyn Write,
        delete_after: bool,
    ) -> Result<bool> {
        self.connected(Operation::Download)?
            .download_to(remote, sink, delete_after)
    }

    /// Download every matching file of the current folder into
    /// `destination`, which must already exist. Returns the number of
    /// verified downloads.
    pub fn download_files(
        &mut self,
        pattern: &str,
        destination: impl AsRef<Path>,
        delete_after: bool,
    ) -> Result<usize> {
        let destination = destination.as_ref();
        self.connected(Operation::Download)?;
        if !destination.is_dir() {
            return Err(Error::path_not_found(
                Operation::Download,
                destination.display().to_string(),
            ));
        }

        let names = self.files_list(pattern)?;
        let adapter = self.connected(Operation::Download)?;
        let mut done = 0;
        for name in names {
            if adapter.download_file(&name, &destination.join(&name), delete_after)? {
                done += 1;
            }
        }
        info!(
            "downloaded {} file(s) matching '{}' to {}",
            done,
            pattern,
            destination.display()
        );
        Ok(done)
    }

    /// Upload a local file to `remote`. The local file must exist; it is
    /// removed afterwards only when `delete_after` is set and the upload
    /// verified.
    pub fn upload_file(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
        delete_after: bool,
    ) -> Result<bool> {
        let local = local.as_ref();
        let adapter = self.connected(Operation::Upload)?;
        if !local.is_file() {
            return Err(Error::path_not_found(
                Operation::Upload,
                local.display().to_string(),
            ));
        }
        adapter.upload_file(local, remote, delete_after)
    }

    /// Upload under the local file's own name.
    pub fn upload_file_keep_name(
        &mut self,
        local: impl AsRef<Path>,
        delete_after: bool,
    ) -> Result<bool> {
        let local = local.as_ref();
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::path_not_found(Operation::Upload, local.display().to_string())
            })?;
        self.upload_file(local, &name, delete_after)
    }

    pub fn upload_from(&mut self, source: &mut dyn Read, remote: &str) -> Result<bool> {
        self.connected(Operation::Upload)?.upload_from(source, remote)
    }

    pub fn rename_file(&mut self, current: &str, new_name: &str) -> Result<bool> {
        self.connected(Operation::Rename)?.rename_file(current, new_name)
    }

    pub fn copy_file(&mut self, from: &str, to: &str) -> Result<bool> {
        self.connected(Operation::Copy)?.copy_file(from, to)
    }

    pub fn move_file(&mut self, from: &str, to: &str) -> Result<bool> {
        self.connected(Operation::Move)?.move_file(from, to)
    }

    pub fn file_exists(&mut self, path: &str) -> Result<bool> {
        self.connected(Operation::Exists)?.file_exists(path)
    }

    // ── Listings ─────────────────────────────────────────────────────

    /// File names of the current folder. An empty pattern returns the full
    /// listing; otherwise only matching names, possibly none.
    pub fn files_list(&mut self, pattern: &str) -> Result<Vec<String>> {
        let names = self.connected(Operation::ListFiles)?.list_files(None)?;
        if pattern.is_empty() {
            return Ok(names);
        }
        Ok(compile(pattern, Operation::ListFiles)?.filter(names))
    }

    pub fn files_list_in(&mut self, path: &str) -> Result<Vec<String>> {
        self.connected(Operation::ListFiles)?.list_files(Some(path))
    }

    pub fn folders_list(&mut self) -> Result<Vec<String>> {
        self.connected(Operation::ListFolders)?.list_folders(None)
    }

    pub fn folders_list_in(&mut self, path: &str) -> Result<Vec<String>> {
        self.connected(Operation::ListFolders)?.list_folders(Some(path))
    }

    // ── Folders ──────────────────────────────────────────────────────

    /// Create `path` (normalised) and any missing parents.
    pub fn create_folder(&mut self, path: &str) -> Result<bool> {
        let target = path::normalize(path);
        self.connected(Operation::CreateFolder)?.create_folder(&target)
    }

    pub fn delete_folder(&mut self, path: &str, recursive: bool) -> Result<bool> {
        self.connected(Operation::DeleteFolder)?
            .delete_folder(path, recursive)
    }

    pub fn folder_exists(&mut self, path: &str) -> Result<bool> {
        self.connected(Operation::Exists)?.folder_exists(path)
    }

    pub fn set_current_folder(&mut self, path: &str) -> Result<()> {
        let target = path::normalize(path);
        self.live(Operation::ChangeDirectory)?
            .set_working_directory(&target)
    }

    pub fn current_folder(&mut self) -> Result<String> {
        self.live(Operation::CurrentDirectory)?.working_directory()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn compile(pattern: &str, op: Operation) -> Result<NameMatcher> {
    NameMatcher::compile(pattern).map_err(|e| {
        Error::generic(op, format!("invalid file pattern '{}'", pattern)).with_source(e)
    })
}
