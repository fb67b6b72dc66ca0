//! `ProtocolAdapter` over an FTP control connection.
//!
//! The working directory is the server's own CWD/PWD state. Folder
//! existence is probed with CWD (restoring the previous directory), file
//! existence and transfer verification with SIZE.

use crate::options::FtpOptions;
use crate::parser;
use crate::translate::{at, translate};
use crate::transport::{FtpTransport, SuppaTransport};
use filegate_core::verify::{self, CountingReader, CountingWriter};
use filegate_core::{folders, Operation, ProtocolAdapter, RemoteEntry, RemoteOps, Result};
use log::{debug, info, warn};
use std::io::{Read, Write};

pub struct FtpAdapter<T: FtpTransport = SuppaTransport> {
    options: FtpOptions,
    transport: T,
}

impl FtpAdapter<SuppaTransport> {
    pub fn new(options: FtpOptions) -> Self {
        Self::with_transport(options, SuppaTransport::new())
    }
}

impl<T: FtpTransport> FtpAdapter<T> {
    pub fn with_transport(options: FtpOptions, transport: T) -> Self {
        Self { options, transport }
    }

    pub fn options(&self) -> &FtpOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// CWD into `path` and straight back.
    fn probe_dir(&mut self, path: &str) -> Result<bool> {
        let saved = self
            .transport
            .pwd()
            .map_err(|e| translate(e, Operation::CurrentDirectory, None))?;
        match self.transport.cwd(path) {
            Ok(()) => {
                self.transport
                    .cwd(&saved)
                    .map_err(at(Operation::ChangeDirectory, &saved))?;
                Ok(true)
            }
            Err(e) if e.is_unavailable() => Ok(false),
            Err(e) => Err(translate(e, Operation::Exists, Some(path))),
        }
    }

    fn size_of(&mut self, path: &str, op: Operation) -> Result<Option<u64>> {
        match self.transport.size(path) {
            Ok(size) => Ok(Some(size)),
            Err(e) if e.is_unavailable() => Ok(None),
            Err(e) => Err(translate(e, op, Some(path))),
        }
    }
}

impl<T: FtpTransport> RemoteOps for FtpAdapter<T> {
    fn entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let lines = self
            .transport
            .list(Some(path))
            .map_err(at(Operation::ListFiles, path))?;
        Ok(parser::parse_listing(&lines, path))
    }

    fn remove_file(&mut self, path: &str) -> Result<()> {
        self.transport
            .remove_file(path)
            .map_err(at(Operation::Delete, path))
    }

    fn remove_dir(&mut self, path: &str) -> Result<()> {
        self.transport
            .rmdir(path)
            .map_err(at(Operation::DeleteFolder, path))
    }

    fn make_dir(&mut self, path: &str) -> Result<()> {
        self.transport
            .mkdir(path)
            .map_err(at(Operation::CreateFolder, path))
    }

    fn dir_exists(&mut self, path: &str) -> Result<bool> {
        self.probe_dir(path)
    }

    fn remote_size(&mut self, path: &str) -> Result<Option<u64>> {
        self.size_of(path, Operation::Upload)
    }
}

impl<T: FtpTransport> ProtocolAdapter for FtpAdapter<T> {
    fn connect(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.transport
            .connect(&self.options)
            .map_err(|e| translate(e, Operation::Connect, None))?;
        info!(
            "connected to ftp://{}:{} ({:?})",
            self.options.host, self.options.port, self.options.security
        );
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            return Ok(());
        }
        self.transport
            .quit()
            .map_err(|e| translate(e, Operation::Disconnect, None))?;
        info!("disconnected from ftp://{}", self.options.host);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    fn delete_file(&mut self, path: &str) -> Result<bool> {
        RemoteOps::remove_file(self, path)?;
        info!("deleted {}", path);
        Ok(true)
    }

    fn download_to(&mut self, remote: &str, sink: &mut dyn Write, delete_source: bool) -> Result<bool> {
        let expected = self
            .transport
            .size(remote)
            .map_err(at(Operation::Download, remote))?;

        let mut counter = CountingWriter::new(sink);
        self.transport
            .retrieve(remote, &mut counter)
            .map_err(at(Operation::Download, remote))?;
        verify::confirm_download(remote, expected, counter.count())?;

        if delete_source {
            RemoteOps::remove_file(self, remote)?;
            debug!("removed remote source {}", remote);
        }
        info!("downloaded {} ({} bytes)", remote, expected);
        Ok(true)
    }

    fn upload_from(&mut self, source: &mut dyn Read, remote: &str) -> Result<bool> {
        let mut counter = CountingReader::new(source);
        let stored = self.transport.store(remote, &mut counter);
        let sent = counter.count();
        if let Err(e) = stored {
            let read_error = counter.take_read_error();
            let err = translate(e, Operation::Upload, Some(remote));
            return Err(verify::abort_upload(self, remote, sent, read_error, err));
        }

        let verified = verify::confirm_upload(self, remote, sent)?;
        if verified {
            info!("uploaded {} ({} bytes)", remote, sent);
        }
        Ok(verified)
    }

    fn rename_file(&mut self, from: &str, to: &str) -> Result<bool> {
        self.transport
            .rename(from, to)
            .map_err(at(Operation::Rename, from))?;
        info!("renamed {} → {}", from, to);
        Ok(true)
    }

    fn file_exists(&mut self, path: &str) -> Result<bool> {
        Ok(self.size_of(path, Operation::Exists)?.is_some())
    }

    fn list_entries(&mut self, path: Option<&str>) -> Result<Vec<RemoteEntry>> {
        match path {
            Some(p) => self.entries(p),
            None => {
                let cwd = self.working_directory()?;
                let lines = self
                    .transport
                    .list(None)
                    .map_err(at(Operation::ListFiles, &cwd))?;
                Ok(parser::parse_listing(&lines, &cwd))
            }
        }
    }

    fn create_folder(&mut self, path: &str) -> Result<bool> {
        folders::create_folder(self, path)?;
        Ok(true)
    }

    fn delete_folder(&mut self, path: &str, recursive: bool) -> Result<bool> {
        folders::delete_folder(self, path, recursive)?;
        Ok(true)
    }

    fn folder_exists(&mut self, path: &str) -> Result<bool> {
        self.probe_dir(path)
    }

    fn set_working_directory(&mut self, path: &str) -> Result<()> {
        self.transport
            .cwd(path)
            .map_err(at(Operation::ChangeDirectory, path))?;
        debug!("CWD {}", path);
        Ok(())
    }

    fn working_directory(&mut self) -> Result<String> {
        self.transport
            .pwd()
            .map_err(|e| translate(e, Operation::CurrentDirectory, None))
    }
}

impl<T: FtpTransport> Drop for FtpAdapter<T> {
    fn drop(&mut self) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.quit() {
                warn!("FTP QUIT on drop failed: {}", e);
            }
        }
    }
}
