//! Post-transfer size verification and rollback.
//!
//! A transfer only counts as successful when both ends agree on the byte
//! length. Uploads that fail the check are removed from the server; path
//! downloads that fail are removed from the local disk. Caller-owned
//! writers are never touched beyond what was written into them.

use crate::adapter::RemoteOps;
use crate::error::{Error, Operation, Result};
use log::{debug, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// `Read` wrapper counting the bytes handed out.
///
/// A failing inner read is remembered, so a transport error caused by the
/// local source can be told apart from a network failure.
pub struct CountingReader<R> {
    inner: R,
    count: u64,
    read_error: Option<io::Error>,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            count: 0,
            read_error: None,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// The first error the source itself returned, if any.
    pub fn take_read_error(&mut self) -> Option<io::Error> {
        self.read_error.take()
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => {
                self.count += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                if self.read_error.is_none() {
                    self.read_error = Some(io::Error::new(e.kind(), e.to_string()));
                }
                Err(e)
            }
        }
    }
}

/// `Write` wrapper counting the bytes accepted.
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── Upload ───────────────────────────────────────────────────────────

/// Check an uploaded file against the number of bytes read from the source.
///
/// Returns `Ok(true)` when the remote size matches. A missing destination
/// yields `Ok(false)`; a size mismatch deletes the destination first.
pub fn confirm_upload<R>(ops: &mut R, remote: &str, source_len: u64) -> Result<bool>
where
    R: RemoteOps + ?Sized,
{
    match ops.remote_size(remote)? {
        Some(size) if size == source_len => {
            debug!("upload verified: {} ({} bytes)", remote, size);
            Ok(true)
        }
        Some(size) => {
            warn!(
                "upload of {} truncated ({} of {} bytes), removing destination",
                remote, size, source_len
            );
            ops.remove_file(remote)?;
            Ok(false)
        }
        None => {
            warn!("upload of {} left no destination file", remote);
            Ok(false)
        }
    }
}

/// Clean up after an upload whose transfer failed.
///
/// Bytes already sent are removed from the server; a failed removal is only
/// logged. A failure of the local source wins over `transport_err`.
pub fn abort_upload<R>(
    ops: &mut R,
    remote: &str,
    sent: u64,
    read_error: Option<io::Error>,
    transport_err: Error,
) -> Error
where
    R: RemoteOps + ?Sized,
{
    if sent > 0 {
        match ops.remove_file(remote) {
            Ok(()) => warn!("upload of {} failed after {} bytes, partial file removed", remote, sent),
            Err(e) => warn!("could not remove partial upload {}: {}", remote, e),
        }
    }
    match read_error {
        Some(e) => Error::local_io(Operation::Upload, remote, e),
        None => transport_err,
    }
}

// ── Download ─────────────────────────────────────────────────────────

/// Compare the bytes received with the size the server reports.
pub fn confirm_download(remote: &str, remote_size: u64, received: u64) -> Result<()> {
    if remote_size == received {
        debug!("download verified: {} ({} bytes)", remote, received);
        Ok(())
    } else {
        warn!(
            "download of {} incomplete ({} of {} bytes)",
            remote, received, remote_size
        );
        Err(Error::incomplete(Operation::Download, remote))
    }
}

/// Run `fetch` against a freshly created local file and drop that file again
/// if `fetch` fails for any reason.
pub fn download_into_file<F>(local: &Path, fetch: F) -> Result<bool>
where
    F: FnOnce(&mut dyn Write) -> Result<bool>,
{
    let display = local.display().to_string();
    let mut file =
        fs::File::create(local).map_err(|e| Error::local_io(Operation::Download, &display, e))?;

    let outcome = fetch(&mut file).and_then(|ok| {
        file.flush()
            .map_err(|e| Error::local_io(Operation::Download, &display, e))?;
        Ok(ok)
    });
    drop(file);

    if outcome.is_err() {
        if let Err(e) = fs::remove_file(local) {
            warn!("could not remove partial download {}: {}", display, e);
        }
    }
    outcome
}

// ── Local files ──────────────────────────────────────────────────────

/// Open a local source file, mapping a missing file to `PathNotFound`.
pub fn open_local(local: &Path) -> Result<fs::File> {
    let display = local.display().to_string();
    fs::File::open(local).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::path_not_found(Operation::Upload, display),
        _ => Error::local_io(Operation::Upload, display, e),
    })
}

pub fn remove_local(local: &Path, op: Operation) -> Result<()> {
    fs::remove_file(local).map_err(|e| Error::local_io(op, local.display().to_string(), e))
}
