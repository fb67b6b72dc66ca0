//! `ProtocolAdapter` over an SFTP channel.
//!
//! SFTP has no server-side working directory, so the adapter keeps one and
//! resolves every relative path against it before calling the transport.

use crate::error::SftpError;
use crate::fingerprint::{colon_hex, Fingerprint};
use crate::options::SftpOptions;
use crate::translate::{at, translate};
use crate::transport::{RemoteStat, SftpTransport, Ssh2Transport};
use filegate_core::verify::{self, CountingReader, CountingWriter};
use filegate_core::{
    folders, path, EntryKind, Error, Operation, ProtocolAdapter, RemoteEntry, RemoteOps, Result,
};
use log::{debug, info, warn};
use std::io::{Read, Write};

pub struct SftpAdapter<T: SftpTransport = Ssh2Transport> {
    options: SftpOptions,
    transport: T,
    cwd: String,
}

impl SftpAdapter<Ssh2Transport> {
    pub fn new(options: SftpOptions) -> Self {
        Self::with_transport(options, Ssh2Transport::new())
    }
}

impl<T: SftpTransport> SftpAdapter<T> {
    pub fn with_transport(options: SftpOptions, transport: T) -> Self {
        Self {
            options,
            transport,
            cwd: "/".into(),
        }
    }

    pub fn options(&self) -> &SftpOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute form of `p` against the tracked working directory.
    fn resolve(&self, p: &str) -> String {
        if p.starts_with('/') {
            p.to_string()
        } else if p.is_empty() || p == "." {
            self.cwd.clone()
        } else {
            path::join(&self.cwd, p.trim_start_matches("./"))
        }
    }

    /// `None` when the path does not exist.
    fn try_stat(&mut self, p: &str, op: Operation) -> Result<Option<RemoteStat>> {
        match self.transport.stat(p) {
            Ok(stat) => Ok(Some(stat)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(translate(e, op, Some(p))),
        }
    }

    /// Drop a half-open session after `context`.
    fn close_quietly(&mut self, context: &str) {
        if let Err(e) = self.transport.close() {
            debug!("close after {} failed: {}", context, e);
        }
    }

    /// Reject the server unless its host key hashes to the pinned value.
    fn check_host_key(&mut self) -> Result<()> {
        let Some(raw) = self.options.fingerprint.clone() else {
            debug!("no fingerprint pinned for {}, accepting host key", self.options.host);
            return Ok(());
        };
        let pinned = match Fingerprint::parse(&raw) {
            Ok(pinned) => pinned,
            Err(e) => {
                self.close_quietly("invalid fingerprint");
                return Err(Error::connection(e.to_string())
                    .with_operation(Operation::Connect)
                    .with_source(e));
            }
        };

        let presented = self.transport.host_key_hash(pinned.kind()).unwrap_or_default();
        if pinned.matches(&presented) {
            debug!("host key of {} matches pinned fingerprint", self.options.host);
            return Ok(());
        }

        let presented = colon_hex(&presented);
        warn!(
            "host key rejected for {}: expected {}, presented {}",
            self.options.host, pinned, presented
        );
        self.close_quietly("host key rejection");
        Err(translate(
            SftpError::HostKeyMismatch {
                expected: pinned.to_string(),
                presented,
            },
            Operation::Connect,
            None,
        ))
    }
}

impl<T: SftpTransport> RemoteOps for SftpAdapter<T> {
    fn entries(&mut self, p: &str) -> Result<Vec<RemoteEntry>> {
        let dir = self.resolve(p);
        let children = self
            .transport
            .read_dir(&dir)
            .map_err(at(Operation::ListFiles, &dir))?;
        Ok(children
            .into_iter()
            .map(|(name, stat)| {
                let kind = if stat.is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                let entry = RemoteEntry::new(name, kind, dir.as_str());
                match stat.size {
                    Some(size) if !stat.is_dir => entry.with_size(size),
                    _ => entry,
                }
            })
            .collect())
    }

    fn remove_file(&mut self, p: &str) -> Result<()> {
        let target = self.resolve(p);
        self.transport
            .unlink(&target)
            .map_err(at(Operation::Delete, &target))
    }

    fn remove_dir(&mut self, p: &str) -> Result<()> {
        let target = self.resolve(p);
        self.transport
            .rmdir(&target)
            .map_err(at(Operation::DeleteFolder, &target))
    }

    fn make_dir(&mut self, p: &str) -> Result<()> {
        let target = self.resolve(p);
        self.transport
            .mkdir(&target)
            .map_err(at(Operation::CreateFolder, &target))
    }

    fn dir_exists(&mut self, p: &str) -> Result<bool> {
        let target = self.resolve(p);
        Ok(self
            .try_stat(&target, Operation::Exists)?
            .map_or(false, |s| s.is_dir))
    }

    fn remote_size(&mut self, p: &str) -> Result<Option<u64>> {
        let target = self.resolve(p);
        Ok(self
            .try_stat(&target, Operation::Upload)?
            .filter(|s| !s.is_dir)
            .map(|s| s.size.unwrap_or(0)))
    }
}

impl<T: SftpTransport> ProtocolAdapter for SftpAdapter<T> {
    fn connect(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.transport
            .open(&self.options)
            .map_err(|e| translate(e, Operation::Connect, None))?;
        self.check_host_key()?;

        let user = self.options.username.clone();
        let password = self.options.password.clone();
        if let Err(e) = self.transport.authenticate(&user, &password) {
            self.close_quietly("failed login");
            return Err(translate(e, Operation::Connect, None));
        }

        self.cwd = self
            .transport
            .realpath(".")
            .unwrap_or_else(|_| "/".to_string());
        info!(
            "connected to sftp://{}@{}:{} (home {})",
            self.options.username, self.options.host, self.options.port, self.cwd
        );
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            return Ok(());
        }
        self.transport
            .close()
            .map_err(|e| translate(e, Operation::Disconnect, None))?;
        info!("disconnected from sftp://{}", self.options.host);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    fn delete_file(&mut self, p: &str) -> Result<bool> {
        RemoteOps::remove_file(self, p)?;
        info!("deleted {}", p);
        Ok(true)
    }

    fn download_to(&mut self, remote: &str, sink: &mut dyn Write, delete_source: bool) -> Result<bool> {
        let source = self.resolve(remote);
        let stat = self
            .transport
            .stat(&source)
            .map_err(at(Operation::Download, &source))?;
        let expected = stat.size.ok_or_else(|| {
            Error::generic(Operation::Download, format!("server reported no size for '{}'", source))
                .with_path(source.as_str())
        })?;

        let mut counter = CountingWriter::new(sink);
        self.transport
            .read_file(&source, &mut counter)
            .map_err(at(Operation::Download, &source))?;
        verify::confirm_download(&source, expected, counter.count())?;

        if delete_source {
            RemoteOps::remove_file(self, &source)?;
            debug!("removed remote source {}", source);
        }
        info!("downloaded {} ({} bytes)", source, expected);
        Ok(true)
    }

    fn upload_from(&mut self, source: &mut dyn Read, remote: &str) -> Result<bool> {
        let target = self.resolve(remote);
        let mut counter = CountingReader::new(source);
        let written = self.transport.write_file(&target, &mut counter);
        let sent = counter.count();
        if let Err(e) = written {
            let read_error = counter.take_read_error();
            let err = translate(e, Operation::Upload, Some(target.as_str()));
            return Err(verify::abort_upload(self, &target, sent, read_error, err));
        }

        let verified = verify::confirm_upload(self, &target, sent)?;
        if verified {
            info!("uploaded {} ({} bytes)", target, sent);
        }
        Ok(verified)
    }

    fn rename_file(&mut self, from: &str, to: &str) -> Result<bool> {
        let (src, dst) = (self.resolve(from), self.resolve(to));
        self.transport
            .rename(&src, &dst)
            .map_err(at(Operation::Rename, &src))?;
        info!("renamed {} → {}", src, dst);
        Ok(true)
    }

    fn file_exists(&mut self, p: &str) -> Result<bool> {
        let target = self.resolve(p);
        Ok(self
            .try_stat(&target, Operation::Exists)?
            .map_or(false, |s| !s.is_dir))
    }

    fn list_entries(&mut self, p: Option<&str>) -> Result<Vec<RemoteEntry>> {
        let dir = p.map(str::to_string).unwrap_or_else(|| self.cwd.clone());
        self.entries(&dir)
    }

    fn create_folder(&mut self, p: &str) -> Result<bool> {
        let target = self.resolve(p);
        folders::create_folder(self, &target)?;
        Ok(true)
    }

    fn delete_folder(&mut self, p: &str, recursive: bool) -> Result<bool> {
        let target = self.resolve(p);
        folders::delete_folder(self, &target, recursive)?;
        Ok(true)
    }

    fn folder_exists(&mut self, p: &str) -> Result<bool> {
        self.dir_exists(p)
    }

    fn set_working_directory(&mut self, p: &str) -> Result<()> {
        let target = self.resolve(p);
        match self.try_stat(&target, Operation::ChangeDirectory)? {
            Some(stat) if stat.is_dir => {}
            _ => return Err(Error::path_not_found(Operation::ChangeDirectory, target)),
        }
        self.cwd = self.transport.realpath(&target).unwrap_or(target);
        debug!("working directory now {}", self.cwd);
        Ok(())
    }

    fn working_directory(&mut self) -> Result<String> {
        Ok(self.cwd.clone())
    }
}

impl<T: SftpTransport> Drop for SftpAdapter<T> {
    fn drop(&mut self) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.close() {
                warn!("SFTP close on drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SftpResult;
    use crate::fingerprint::HashKind;
    use filegate_core::ErrorKind;
    use ssh2::ErrorCode;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    const HOST_KEY_MD5: [u8; 16] = [
        0x9d, 0x38, 0x5b, 0x83, 0xa9, 0x17, 0x52, 0x92, 0x56, 0x1a, 0x5e, 0xc4, 0xd4, 0x81, 0x8e,
        0x0a,
    ];

    fn status(code: i32) -> SftpError {
        SftpError::Ssh(ssh2::Error::new(ErrorCode::SFTP(code), "status"))
    }

    /// In-memory SFTP server. `None` nodes are directories.
    struct MemoryServer {
        opened: bool,
        authenticated: bool,
        password: String,
        home: String,
        nodes: BTreeMap<String, Option<Vec<u8>>>,
        store_limit: Option<usize>,
        calls: Vec<String>,
    }

    impl MemoryServer {
        fn new() -> Self {
            let mut nodes = BTreeMap::new();
            nodes.insert("/".to_string(), None);
            nodes.insert("/home".to_string(), None);
            nodes.insert("/home/deploy".to_string(), None);
            Self {
                opened: false,
                authenticated: false,
                password: "secret".into(),
                home: "/home/deploy".into(),
                nodes,
                store_limit: None,
                calls: Vec::new(),
            }
        }

        fn dir(mut self, p: &str) -> Self {
            self.nodes.insert(p.to_string(), None);
            self
        }

        fn file(mut self, p: &str, data: &[u8]) -> Self {
            self.nodes.insert(p.to_string(), Some(data.to_vec()));
            self
        }

        fn parent_of(p: &str) -> &str {
            match p.rfind('/') {
                Some(0) | None => "/",
                Some(i) => &p[..i],
            }
        }

        fn stat_of(node: &Option<Vec<u8>>) -> RemoteStat {
            RemoteStat {
                is_dir: node.is_none(),
                size: Some(node.as_ref().map_or(4096, |d| d.len() as u64)),
            }
        }

        fn require_abs(&self, p: &str) -> SftpResult<()> {
            assert!(p.starts_with('/'), "transport got relative path {}", p);
            Ok(())
        }
    }

    impl SftpTransport for MemoryServer {
        fn open(&mut self, _options: &SftpOptions) -> SftpResult<()> {
            self.calls.push("open".into());
            self.opened = true;
            Ok(())
        }
        fn host_key_hash(&self, kind: HashKind) -> Option<Vec<u8>> {
            match kind {
                HashKind::Md5 => Some(HOST_KEY_MD5.to_vec()),
                HashKind::Sha1 => Some(vec![1; 20]),
                HashKind::Sha256 => Some(vec![2; 32]),
            }
        }
        fn authenticate(&mut self, _username: &str, password: &str) -> SftpResult<()> {
            self.calls.push("auth".into());
            if password != self.password {
                return Err(SftpError::AuthRejected("bad password".into()));
            }
            self.authenticated = true;
            Ok(())
        }
        fn close(&mut self) -> SftpResult<()> {
            self.calls.push("close".into());
            self.opened = false;
            self.authenticated = false;
            Ok(())
        }
        fn is_connected(&self) -> bool {
            self.opened && self.authenticated
        }
        fn stat(&mut self, p: &str) -> SftpResult<RemoteStat> {
            self.require_abs(p)?;
            self.nodes.get(p).map(Self::stat_of).ok_or_else(|| status(2))
        }
        fn read_dir(&mut self, p: &str) -> SftpResult<Vec<(String, RemoteStat)>> {
            self.require_abs(p)?;
            if !matches!(self.nodes.get(p), Some(None)) {
                return Err(status(2));
            }
            Ok(self
                .nodes
                .iter()
                .filter(|(k, _)| k.as_str() != "/" && Self::parent_of(k) == p)
                .map(|(k, n)| (path::file_name(k).to_string(), Self::stat_of(n)))
                .collect())
        }
        fn read_file(&mut self, p: &str, sink: &mut dyn Write) -> SftpResult<u64> {
            match self.nodes.get(p) {
                Some(Some(data)) => {
                    sink.write_all(data)?;
                    Ok(data.len() as u64)
                }
                _ => Err(status(2)),
            }
        }
        fn write_file(&mut self, p: &str, source: &mut dyn Read) -> SftpResult<u64> {
            self.require_abs(p)?;
            if !matches!(self.nodes.get(Self::parent_of(p)), Some(None)) {
                return Err(status(2));
            }
            let mut data = Vec::new();
            let read = source.read_to_end(&mut data);
            let sent = data.len() as u64;
            if let Some(limit) = self.store_limit {
                data.truncate(limit);
            }
            self.nodes.insert(p.to_string(), Some(data));
            read?;
            Ok(sent)
        }
        fn mkdir(&mut self, p: &str) -> SftpResult<()> {
            self.require_abs(p)?;
            if self.nodes.contains_key(p) {
                return Err(status(4));
            }
            self.calls.push(format!("mkdir {}", p));
            self.nodes.insert(p.to_string(), None);
            Ok(())
        }
        fn rmdir(&mut self, p: &str) -> SftpResult<()> {
            let has_children = self.nodes.keys().any(|k| k != p && Self::parent_of(k) == p);
            if has_children {
                return Err(status(4));
            }
            self.calls.push(format!("rmdir {}", p));
            self.nodes.remove(p).map(|_| ()).ok_or_else(|| status(2))
        }
        fn unlink(&mut self, p: &str) -> SftpResult<()> {
            match self.nodes.get(p) {
                Some(Some(_)) => {
                    self.calls.push(format!("unlink {}", p));
                    self.nodes.remove(p);
                    Ok(())
                }
                _ => Err(status(2)),
            }
        }
        fn rename(&mut self, from: &str, to: &str) -> SftpResult<()> {
            let node = self.nodes.remove(from).ok_or_else(|| status(2))?;
            self.nodes.insert(to.to_string(), node);
            Ok(())
        }
        fn realpath(&mut self, p: &str) -> SftpResult<String> {
            if p == "." {
                Ok(self.home.clone())
            } else {
                Ok(p.to_string())
            }
        }
    }

    fn options() -> SftpOptions {
        SftpOptions {
            host: "sftp.example.org".into(),
            username: "deploy".into(),
            password: "secret".into(),
            ..SftpOptions::default()
        }
    }

    fn connected(server: MemoryServer) -> SftpAdapter<MemoryServer> {
        let mut a = SftpAdapter::with_transport(options(), server);
        a.connect().unwrap();
        a
    }

    #[test]
    fn test_connect_starts_in_home() {
        let mut a = connected(MemoryServer::new());
        assert!(a.is_connected());
        assert_eq!(a.working_directory().unwrap(), "/home/deploy");
    }

    #[test]
    fn test_pinned_fingerprint_accepts_matching_key() {
        let mut opts = options();
        opts.fingerprint = Some(colon_hex(&HOST_KEY_MD5));
        let mut a = SftpAdapter::with_transport(opts, MemoryServer::new());
        a.connect().unwrap();
        assert!(a.is_connected());
    }

    #[test]
    fn test_pinned_fingerprint_rejects_other_key() {
        let mut wrong = HOST_KEY_MD5;
        wrong[0] ^= 0xff;
        let mut opts = options();
        opts.fingerprint = Some(colon_hex(&wrong));
        let mut a = SftpAdapter::with_transport(opts, MemoryServer::new());

        let err = a.connect().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!a.is_connected());
        assert!(!a.transport().calls.contains(&"auth".to_string()));
        assert!(a.transport().calls.contains(&"close".to_string()));
    }

    #[test]
    fn test_unparseable_fingerprint_fails_connect() {
        let mut opts = options();
        opts.fingerprint = Some("not-a-fingerprint".into());
        let mut a = SftpAdapter::with_transport(opts, MemoryServer::new());
        assert_eq!(a.connect().unwrap_err().kind(), ErrorKind::Connection);
        assert!(!a.transport().opened);
        assert_eq!(a.transport().calls, vec!["open", "close"]);
    }

    #[test]
    fn test_bad_password_is_authentication() {
        let mut opts = options();
        opts.password = "wrong".into();
        let mut a = SftpAdapter::with_transport(opts, MemoryServer::new());
        let err = a.connect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!a.is_connected());
    }

    #[test]
    fn test_relative_paths_follow_working_directory() {
        let mut a = connected(MemoryServer::new().dir("/data").file("/data/a.txt", b"abc"));
        a.set_working_directory("/data").unwrap();

        assert!(a.file_exists("a.txt").unwrap());
        assert!(!a.file_exists("b.txt").unwrap());
        assert_eq!(a.list_files(None).unwrap(), vec!["a.txt"]);

        let err = a.set_working_directory("/missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
        assert_eq!(a.working_directory().unwrap(), "/data");
    }

    struct FailingSource {
        left: usize,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.left == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk read failed",
                ));
            }
            let n = self.left.min(buf.len());
            self.left -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_source_failure_mid_upload_removes_partial_file() {
        let mut a = connected(MemoryServer::new());

        let err = a
            .upload_from(&mut FailingSource { left: 50 }, "part.bin")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocalIo);
        assert!(!a.transport().nodes.contains_key("/home/deploy/part.bin"));
        assert!(a
            .transport()
            .calls
            .contains(&"unlink /home/deploy/part.bin".to_string()));
    }

    #[test]
    fn test_upload_verified_and_truncated() {
        let mut a = connected(MemoryServer::new());
        let data = vec![7u8; 100];
        assert!(a.upload_from(&mut Cursor::new(data.clone()), "ok.bin").unwrap());
        assert!(a.transport().nodes.contains_key("/home/deploy/ok.bin"));

        let mut server = MemoryServer::new();
        server.store_limit = Some(90);
        let mut a = connected(server);
        assert!(!a.upload_from(&mut Cursor::new(data), "short.bin").unwrap());
        assert!(!a.transport().nodes.contains_key("/home/deploy/short.bin"));
    }

    #[test]
    fn test_download_roundtrip_with_delete() {
        let mut a = connected(MemoryServer::new().file("/home/deploy/r.csv", b"a,b\n"));
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("r.csv");

        assert!(a.download_file("r.csv", &local, true).unwrap());

        assert_eq!(std::fs::read(&local).unwrap(), b"a,b\n");
        assert!(!a.transport().nodes.contains_key("/home/deploy/r.csv"));
    }

    #[test]
    fn test_create_folder_per_segment() {
        let mut a = connected(MemoryServer::new());
        assert!(a.create_folder("/home/deploy/x/y").unwrap());
        let mkdirs: Vec<_> = a
            .transport()
            .calls
            .iter()
            .filter(|c| c.starts_with("mkdir"))
            .cloned()
            .collect();
        assert_eq!(mkdirs, vec!["mkdir /home/deploy/x", "mkdir /home/deploy/x/y"]);
        assert!(a.folder_exists("x/y").unwrap());
    }

    #[test]
    fn test_delete_folder_recursive_and_not_empty() {
        let server = MemoryServer::new()
            .dir("/t")
            .dir("/t/sub")
            .file("/t/sub/inner.txt", b"1")
            .file("/t/top.txt", b"2");
        let mut a = connected(server);

        let err = a.delete_folder("/t", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FolderNotEmpty);
        assert!(a.transport().nodes.contains_key("/t/top.txt"));

        assert!(a.delete_folder("/t", true).unwrap());
        assert!(a.transport().nodes.keys().all(|k| !k.starts_with("/t")));
    }

    #[test]
    fn test_copy_and_move() {
        let mut a = connected(MemoryServer::new().file("/home/deploy/s.txt", b"payload"));

        assert!(a.copy_file("s.txt", "c.txt").unwrap());
        assert_eq!(
            a.transport().nodes.get("/home/deploy/c.txt"),
            Some(&Some(b"payload".to_vec()))
        );
        assert!(a.move_file("c.txt", "/m.txt").unwrap());
        assert!(a.transport().nodes.contains_key("/m.txt"));
        assert!(!a.move_file("ghost.txt", "x.txt").unwrap());
    }

    #[test]
    fn test_missing_file_errors_carry_path() {
        let mut a = connected(MemoryServer::new());
        let err = a.delete_file("nope.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
        assert_eq!(err.path.as_deref(), Some("/home/deploy/nope.txt"));
    }

    #[test]
    fn test_disconnect_closes_once() {
        let mut a = connected(MemoryServer::new());
        a.disconnect().unwrap();
        a.disconnect().unwrap();
        let closes = a.transport().calls.iter().filter(|c| *c == "close").count();
        assert_eq!(closes, 1);
    }
}
