//! The SFTP transport seam and its `ssh2` implementation.
//!
//! Connecting is split in two so the adapter can check the host key between
//! the SSH handshake and authentication: [`SftpTransport::open`] does TCP +
//! handshake, [`SftpTransport::authenticate`] logs in and opens the SFTP
//! channel.

use crate::error::{SftpError, SftpResult};
use crate::fingerprint::HashKind;
use crate::options::SftpOptions;
use log::{debug, info, warn};
use ssh2::{Session, Sftp};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Subset of remote file attributes the adapter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub is_dir: bool,
    pub size: Option<u64>,
}

impl From<&ssh2::FileStat> for RemoteStat {
    fn from(stat: &ssh2::FileStat) -> Self {
        Self {
            is_dir: stat.is_dir(),
            size: stat.size,
        }
    }
}

/// Blocking SFTP command set used by [`crate::SftpAdapter`]. Paths are
/// passed through untouched; the adapter resolves them first.
pub trait SftpTransport {
    /// TCP connect and SSH handshake.
    fn open(&mut self, options: &SftpOptions) -> SftpResult<()>;
    /// Hash of the server host key, available after `open`.
    fn host_key_hash(&self, kind: HashKind) -> Option<Vec<u8>>;
    /// Log in and open the SFTP channel.
    fn authenticate(&mut self, username: &str, password: &str) -> SftpResult<()>;
    fn close(&mut self) -> SftpResult<()>;
    /// Authenticated with an open SFTP channel.
    fn is_connected(&self) -> bool;

    fn stat(&mut self, path: &str) -> SftpResult<RemoteStat>;
    /// Bare names of the children of `path`, pseudo-entries removed.
    fn read_dir(&mut self, path: &str) -> SftpResult<Vec<(String, RemoteStat)>>;
    fn read_file(&mut self, path: &str, sink: &mut dyn Write) -> SftpResult<u64>;
    /// Create or truncate `path` and fill it from `source`.
    fn write_file(&mut self, path: &str, source: &mut dyn Read) -> SftpResult<u64>;
    fn mkdir(&mut self, path: &str) -> SftpResult<()>;
    fn rmdir(&mut self, path: &str) -> SftpResult<()>;
    fn unlink(&mut self, path: &str) -> SftpResult<()>;
    fn rename(&mut self, from: &str, to: &str) -> SftpResult<()>;
    fn realpath(&mut self, path: &str) -> SftpResult<String>;
}

/// libssh2-backed transport.
#[derive(Default)]
pub struct Ssh2Transport {
    session: Option<Session>,
    sftp: Option<Sftp>,
}

/// Answers every keyboard-interactive prompt with the password.
struct PasswordPrompt<'a> {
    password: &'a str,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.to_string()).collect()
    }
}

impl Ssh2Transport {
    pub fn new() -> Self {
        Self::default()
    }

    fn sftp(&self) -> SftpResult<&Sftp> {
        self.sftp.as_ref().ok_or(SftpError::NotConnected)
    }
}

fn resolve(host: &str, port: u16) -> SftpResult<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        SftpError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address for {}:{}", host, port),
        ))
    })
}

impl SftpTransport for Ssh2Transport {
    fn open(&mut self, options: &SftpOptions) -> SftpResult<()> {
        let addr = resolve(&options.host, options.port)?;
        info!("SFTP connecting to {}", addr);

        let tcp = TcpStream::connect_timeout(
            &addr,
            Duration::from_secs(options.connect_timeout_secs.max(1)),
        )?;
        tcp.set_nonblocking(false)?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        debug!("SSH handshake complete with {}", addr);

        self.session = Some(session);
        Ok(())
    }

    fn host_key_hash(&self, kind: HashKind) -> Option<Vec<u8>> {
        self.session
            .as_ref()?
            .host_key_hash(kind.to_ssh2())
            .map(|bytes| bytes.to_vec())
    }

    fn authenticate(&mut self, username: &str, password: &str) -> SftpResult<()> {
        let session = self.session.as_ref().ok_or(SftpError::NotConnected)?;

        let method = if session.userauth_password(username, password).is_ok()
            && session.authenticated()
        {
            "password"
        } else {
            let mut prompt = PasswordPrompt { password };
            if session
                .userauth_keyboard_interactive(username, &mut prompt)
                .is_ok()
                && session.authenticated()
            {
                "keyboard-interactive"
            } else {
                return Err(SftpError::AuthRejected(format!(
                    "no authentication method succeeded for '{}'",
                    username
                )));
            }
        };

        let sftp = session.sftp()?;
        info!("SFTP authenticated as {} via {}", username, method);
        self.sftp = Some(sftp);
        Ok(())
    }

    fn close(&mut self) -> SftpResult<()> {
        self.sftp = None;
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "closing", None) {
                warn!("SSH disconnect failed: {}", e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.sftp.is_some()
    }

    fn stat(&mut self, path: &str) -> SftpResult<RemoteStat> {
        let stat = self.sftp()?.stat(Path::new(path))?;
        Ok(RemoteStat::from(&stat))
    }

    fn read_dir(&mut self, path: &str) -> SftpResult<Vec<(String, RemoteStat)>> {
        let raw = self.sftp()?.readdir(Path::new(path))?;
        Ok(raw
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().to_string();
                if name == "." || name == ".." {
                    return None;
                }
                Some((name, RemoteStat::from(&stat)))
            })
            .collect())
    }

    fn read_file(&mut self, path: &str, sink: &mut dyn Write) -> SftpResult<u64> {
        let mut file = self.sftp()?.open(Path::new(path))?;
        Ok(io::copy(&mut file, sink)?)
    }

    fn write_file(&mut self, path: &str, source: &mut dyn Read) -> SftpResult<u64> {
        let mut file = self.sftp()?.create(Path::new(path))?;
        let written = io::copy(source, &mut file)?;
        file.flush()?;
        Ok(written)
    }

    fn mkdir(&mut self, path: &str) -> SftpResult<()> {
        Ok(self.sftp()?.mkdir(Path::new(path), 0o755)?)
    }

    fn rmdir(&mut self, path: &str) -> SftpResult<()> {
        Ok(self.sftp()?.rmdir(Path::new(path))?)
    }

    fn unlink(&mut self, path: &str) -> SftpResult<()> {
        Ok(self.sftp()?.unlink(Path::new(path))?)
    }

    fn rename(&mut self, from: &str, to: &str) -> SftpResult<()> {
        Ok(self.sftp()?.rename(Path::new(from), Path::new(to), None)?)
    }

    fn realpath(&mut self, path: &str) -> SftpResult<String> {
        let resolved = self.sftp()?.realpath(Path::new(path))?;
        Ok(resolved.to_string_lossy().replace('\\', "/"))
    }
}
