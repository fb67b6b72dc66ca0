//! The FTP transport seam.
//!
//! `FtpTransport` is the narrow command set the adapter needs. The real
//! implementation drives a blocking `suppaftp` stream; tests substitute an
//! in-memory server.
//!
//! Lifecycle of [`SuppaTransport::connect`]: TCP connect → optional TLS
//! (implicit wraps immediately, explicit upgrades via AUTH TLS) → USER/PASS
//! → TYPE I.

use crate::error::{FtpError, FtpErrorKind, FtpResult};
use crate::options::{FtpOptions, FtpSecurity};
use crate::tls;
use log::{debug, info, warn};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::NativeTlsFtpStream;

/// Blocking FTP command set used by [`crate::FtpAdapter`].
pub trait FtpTransport {
    /// Open the control connection and log in.
    fn connect(&mut self, options: &FtpOptions) -> FtpResult<()>;
    fn quit(&mut self) -> FtpResult<()>;
    /// Connected *and* authenticated.
    fn is_connected(&self) -> bool;

    fn pwd(&mut self) -> FtpResult<String>;
    fn cwd(&mut self, path: &str) -> FtpResult<()>;
    /// Raw listing lines for `path`, or the working directory when `None`.
    /// MLSD facts or LIST output; the parser accepts both.
    fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>>;
    /// SIZE of a remote file.
    fn size(&mut self, path: &str) -> FtpResult<u64>;
    /// RETR into `sink`; returns the bytes written.
    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> FtpResult<u64>;
    /// STOR from `source`; returns the bytes sent.
    fn store(&mut self, path: &str, source: &mut dyn Read) -> FtpResult<u64>;
    fn remove_file(&mut self, path: &str) -> FtpResult<()>;
    fn mkdir(&mut self, path: &str) -> FtpResult<()>;
    fn rmdir(&mut self, path: &str) -> FtpResult<()>;
    fn rename(&mut self, from: &str, to: &str) -> FtpResult<()>;
}

/// `suppaftp`-backed transport (native-tls for FTPS).
///
/// Listings use MLSD until the server rejects it as unimplemented, then
/// LIST for the rest of the session.
#[derive(Default)]
pub struct SuppaTransport {
    stream: Option<NativeTlsFtpStream>,
    mlsd_refused: bool,
}

impl SuppaTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> FtpResult<&mut NativeTlsFtpStream> {
        self.stream.as_mut().ok_or_else(FtpError::not_connected)
    }
}

fn resolve(host: &str, port: u16) -> FtpResult<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| {
            FtpError::connection_failed(format!("resolve {}:{}: {}", host, port, e)).with_source(e)
        })?
        .next()
        .ok_or_else(|| FtpError::connection_failed(format!("no address for {}:{}", host, port)))
}

fn check_reachable(addr: SocketAddr, timeout: Duration) -> FtpResult<()> {
    let probe = TcpStream::connect_timeout(&addr, timeout)?;
    if let Err(e) = probe.shutdown(Shutdown::Both) {
        debug!("closing reachability check to {} failed: {}", addr, e);
    }
    Ok(())
}

impl FtpTransport for SuppaTransport {
    fn connect(&mut self, options: &FtpOptions) -> FtpResult<()> {
        if options.host.is_empty() {
            return Err(FtpError::connection_failed("host must not be empty"));
        }
        let addr = resolve(&options.host, options.port)?;
        let timeout = Duration::from_secs(options.connect_timeout_secs.max(1));

        let mut stream = match options.security {
            FtpSecurity::Implicit => {
                // No timeout variant exists for implicit TLS. Only the TCP
                // connect is bounded; the handshake is not.
                check_reachable(addr, timeout)?;
                let connector = tls::build_tls_connector(options.accept_invalid_certs)?;
                NativeTlsFtpStream::connect_secure_implicit(addr, connector, &options.host)
                    .map_err(|e| FtpError::from(e).with_kind_if_reply(FtpErrorKind::TlsFailed))?
            }
            FtpSecurity::Explicit => {
                let plain = NativeTlsFtpStream::connect_timeout(addr, timeout)?;
                let connector = tls::build_tls_connector(options.accept_invalid_certs)?;
                plain
                    .into_secure(connector, &options.host)
                    .map_err(|e| FtpError::from(e).with_kind_if_reply(FtpErrorKind::TlsFailed))?
            }
            FtpSecurity::None => NativeTlsFtpStream::connect_timeout(addr, timeout)?,
        };
        debug!("FTP control connection open to {} ({:?})", addr, options.security);

        stream
            .login(&options.username, &options.password)
            .map_err(|e| FtpError::from(e).with_kind_if_reply(FtpErrorKind::AuthFailed))?;
        stream.transfer_type(FileType::Binary)?;

        info!(
            "FTP session established: {}@{}:{}",
            options.username, options.host, options.port
        );
        self.stream = Some(stream);
        self.mlsd_refused = false;
        Ok(())
    }

    fn quit(&mut self) -> FtpResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                warn!("FTP QUIT failed: {}", e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn pwd(&mut self) -> FtpResult<String> {
        Ok(self.stream()?.pwd()?)
    }

    fn cwd(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream()?.cwd(path)?)
    }

    fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        if !self.mlsd_refused {
            match self.stream()?.mlsd(path) {
                Ok(lines) => return Ok(lines),
                Err(e) => {
                    let e = FtpError::from(e);
                    if !e.is_unsupported_command() {
                        return Err(e);
                    }
                    debug!("MLSD not supported ({}), using LIST", e);
                    self.mlsd_refused = true;
                }
            }
        }
        Ok(self.stream()?.list(path)?)
    }

    fn size(&mut self, path: &str) -> FtpResult<u64> {
        Ok(self.stream()?.size(path)? as u64)
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> FtpResult<u64> {
        let copied = self.stream()?.retr(path, |data| {
            io::copy(data, &mut *sink).map_err(suppaftp::FtpError::ConnectionError)
        })?;
        Ok(copied)
    }

    fn store(&mut self, path: &str, source: &mut dyn Read) -> FtpResult<u64> {
        let mut source = source;
        Ok(self.stream()?.put_file(path, &mut source)?)
    }

    fn remove_file(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream()?.rm(path)?)
    }

    fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream()?.mkdir(path)?)
    }

    fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream()?.rmdir(path)?)
    }

    fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        Ok(self.stream()?.rename(from, to)?)
    }
}

impl FtpError {
    /// Re-tag a server-reply error raised during a handshake phase.
    ///
    /// Socket and TLS failures keep their own kind.
    fn with_kind_if_reply(mut self, kind: FtpErrorKind) -> Self {
        if self.code.is_some() && self.kind != FtpErrorKind::Disconnected {
            self.kind = kind;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_before_connect_fail() {
        let mut t = SuppaTransport::new();
        assert!(!t.is_connected());
        assert_eq!(t.pwd().unwrap_err().kind, FtpErrorKind::NotConnected);
        assert!(t.quit().is_ok());
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let mut t = SuppaTransport::new();
        let err = t.connect(&FtpOptions::default()).unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::ConnectionFailed);
    }

    #[test]
    fn test_implicit_tls_to_closed_port_fails_fast() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let options = FtpOptions {
            host: "127.0.0.1".into(),
            port,
            security: FtpSecurity::Implicit,
            connect_timeout_secs: 2,
            ..FtpOptions::default()
        };
        let started = std::time::Instant::now();
        let err = SuppaTransport::new().connect(&options).unwrap_err();

        assert!(matches!(
            err.kind,
            FtpErrorKind::ConnectionFailed | FtpErrorKind::Timeout
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_login_reply_becomes_auth_failure() {
        let e = FtpError::from_reply(530, "Login incorrect.")
            .with_kind_if_reply(FtpErrorKind::AuthFailed);
        assert_eq!(e.kind, FtpErrorKind::AuthFailed);
        let e = FtpError::from_reply(421, "bye").with_kind_if_reply(FtpErrorKind::AuthFailed);
        assert_eq!(e.kind, FtpErrorKind::Disconnected);
        let e = FtpError::connection_failed("refused").with_kind_if_reply(FtpErrorKind::AuthFailed);
        assert_eq!(e.kind, FtpErrorKind::ConnectionFailed);
    }
}
