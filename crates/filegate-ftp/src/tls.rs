//! TLS connector for Explicit and Implicit FTPS (RFC 4217).

use crate::error::FtpResult;
use suppaftp::NativeTlsConnector;

/// Build the connector handed to `suppaftp`.
///
/// With `accept_invalid_certs` the peer certificate and host name are not
/// checked at all.
pub fn build_tls_connector(accept_invalid_certs: bool) -> FtpResult<NativeTlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();
    if accept_invalid_certs {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let connector = builder.build()?;
    Ok(NativeTlsConnector::from(connector))
}
