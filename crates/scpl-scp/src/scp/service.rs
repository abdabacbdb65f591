// ── ScpConnection – session lifecycle management ─────────────────────────────

use crate::scp::config::ScpLibraryConfig;
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::session::SshTransport;
use crate::scp::types::*;
use log::{info, warn};

// ── Collaborator seams ───────────────────────────────────────────────────────

/// Copy-protocol client bound 1:1 to an authenticated session.
#[cfg_attr(test, mockall::automock)]
pub trait CopyClient {
    fn put(&mut self, request: &TransferRequest) -> ScpResult<()>;
    fn get(&mut self, request: &TransferRequest) -> ScpResult<()>;
    /// Release the client and tear down the session beneath it.
    fn close(&mut self) -> ScpResult<()>;
}

/// A freshly authenticated session and the copy client bound to it.
pub struct OpenedSession<C> {
    pub client: C,
    pub info: ConnectionInfo,
}

/// Secure remote-shell transport: connect, verify the host key, authenticate.
pub trait Transport {
    type Client: CopyClient;

    fn connect(
        &mut self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> ScpResult<OpenedSession<Self::Client>>;
}

// ── Connection struct ────────────────────────────────────────────────────────

/// Exactly one transport and, while open, the copy client bound to it.
///
/// Not internally synchronised; callers serialise access.
pub struct ScpConnection<T: Transport = SshTransport> {
    transport: T,
    client: Option<T::Client>,
    info: Option<ConnectionInfo>,
}

impl ScpConnection<SshTransport> {
    pub fn new(config: ScpLibraryConfig) -> Self {
        Self::with_transport(SshTransport::new(config))
    }
}

impl Default for ScpConnection<SshTransport> {
    fn default() -> Self {
        Self::new(ScpLibraryConfig::default())
    }
}

impl<T: Transport> ScpConnection<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            client: None,
            info: None,
        }
    }

    // ── Open ─────────────────────────────────────────────────────────────────

    /// Validate the port, connect and authenticate, then bind a copy client.
    ///
    /// An already open session is closed first, even when the new port is
    /// invalid. On failure the connection stays closed and no copy client
    /// exists.
    pub fn open(&mut self, hostname: &str, port: &str, credentials: Credentials) -> ScpResult<()> {
        if self.is_open() {
            info!("SCP closing previous session before reopening");
            self.close();
        }

        let port = parse_port(port)?;

        let target = ConnectionTarget {
            host: hostname.to_string(),
            port,
        };
        let opened = self.transport.connect(&target, &credentials)?;

        info!(
            "SCP connection open to {}:{} as {} ({})",
            opened.info.host, opened.info.port, opened.info.username, opened.info.auth_method
        );
        self.info = Some(opened.info);
        self.client = Some(opened.client);
        Ok(())
    }

    // ── Close ────────────────────────────────────────────────────────────────

    /// Idempotent; a no-op when already closed.
    pub fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            let host = self.info.as_ref().map(|i| i.host.clone()).unwrap_or_default();
            info!("SCP closing connection to {}", host);
            if let Err(e) = client.close() {
                warn!("SCP teardown of {} reported: {}", host, e);
            }
        }
        self.info = None;
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.info.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn client_mut(&mut self) -> ScpResult<&mut T::Client> {
        self.client.as_mut().ok_or_else(ScpError::not_connected)
    }
}

impl<T: Transport> Drop for ScpConnection<T> {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Port validation ──────────────────────────────────────────────────────────

/// Parse a caller-supplied port. Surrounding whitespace is ignored.
pub fn parse_port(port: &str) -> ScpResult<u16> {
    let value: i64 = port
        .trim()
        .parse()
        .map_err(|_| ScpError::invalid_port(format!("Port must be a valid number, got '{}'.", port)))?;
    if !(1..=65535).contains(&value) {
        return Err(ScpError::invalid_port(format!(
            "Port must be between 1 and 65535, got {}.",
            value
        )));
    }
    Ok(value as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scp::testing::{connected_client, FakeTransport};
    use crate::scp::ScpErrorKind;

    #[test]
    fn test_parse_port_valid() {
        assert_eq!(parse_port("22").unwrap(), 22);
        assert_eq!(parse_port(" 4242 ").unwrap(), 4242);
        assert_eq!(parse_port("1").unwrap(), 1);
        assert_eq!(parse_port("65535").unwrap(), 65535);
    }

    #[test]
    fn test_parse_port_rejects_garbage_and_range() {
        for bad in ["notanumber", "", "22a", "0", "65536", "-1", "2.5", "99999999999999999999"] {
            let err = parse_port(bad).unwrap_err();
            assert_eq!(err.kind, ScpErrorKind::InvalidPort, "port {:?}", bad);
        }
    }

    #[test]
    fn test_new_connection_is_closed() {
        let conn = ScpConnection::with_transport(FakeTransport::default());
        assert!(!conn.is_open());
        assert!(conn.connection_info().is_none());
    }

    #[test]
    fn test_open_success_then_close() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![Ok(
            connected_client(),
        )]));

        conn.open("host", "22", Credentials::password("u", "p")).unwrap();
        assert!(conn.is_open());
        assert_eq!(conn.transport().connects, 1);
        let target = conn.transport().last_target.clone().unwrap();
        assert_eq!(target.host, "host");
        assert_eq!(target.port, 22);
        assert_eq!(conn.connection_info().unwrap().username, "u");

        conn.close();
        assert!(!conn.is_open());
        assert!(conn.connection_info().is_none());
    }

    #[test]
    fn test_invalid_port_never_reaches_transport() {
        let mut conn = ScpConnection::with_transport(FakeTransport::default());
        let err = conn
            .open("host", "notanumber", Credentials::password("u", "p"))
            .unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::InvalidPort);
        assert!(!conn.is_open());
        assert_eq!(conn.transport().connects, 0);
    }

    #[test]
    fn test_transport_error_surfaces_unchanged() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![Err(
            ScpError::authentication("All authentication methods exhausted for user 'u'"),
        )]));
        let err = conn
            .open("host", "22", Credentials::password("u", "wrong"))
            .unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::Authentication);
        assert_eq!(err.message, "All authentication methods exhausted for user 'u'");
        assert!(!conn.is_open());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut conn = ScpConnection::with_transport(FakeTransport::default());
        conn.close();
        assert!(!conn.is_open());
        conn.close();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_close_error_is_swallowed() {
        let mut client = MockCopyClient::new();
        client
            .expect_close()
            .times(1)
            .returning(|| Err(ScpError::transport("socket already gone")));
        let mut conn =
            ScpConnection::with_transport(FakeTransport::with_clients(vec![Ok(client)]));
        conn.open("host", "22", Credentials::default()).unwrap();
        conn.close();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_reopen_closes_previous_client() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![
            Ok(connected_client()),
            Ok(connected_client()),
        ]));
        conn.open("first", "22", Credentials::default()).unwrap();
        conn.open("second", "2222", Credentials::default()).unwrap();
        assert!(conn.is_open());
        assert_eq!(conn.transport().connects, 2);
        assert_eq!(conn.connection_info().unwrap().host, "second");
    }

    #[test]
    fn test_failed_reopen_leaves_connection_closed() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![
            Ok(connected_client()),
            Err(ScpError::transport("TCP connection to second:22 failed")),
        ]));
        conn.open("first", "22", Credentials::default()).unwrap();
        assert!(conn.open("second", "22", Credentials::default()).is_err());
        assert!(!conn.is_open());
    }

    #[test]
    fn test_reopen_with_invalid_port_closes_previous_session() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![Ok(
            connected_client(),
        )]));
        conn.open("first", "22", Credentials::default()).unwrap();

        let err = conn
            .open("second", "notanumber", Credentials::default())
            .unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::InvalidPort);
        assert!(!conn.is_open());
        assert!(conn.connection_info().is_none());
        assert_eq!(conn.transport().connects, 1);
    }

    #[test]
    fn test_drop_closes_client() {
        let mut conn = ScpConnection::with_transport(FakeTransport::with_clients(vec![Ok(
            connected_client(),
        )]));
        conn.open("host", "22", Credentials::default()).unwrap();
        // connected_client() expects exactly one close(); the mock verifies it on drop.
        drop(conn);
    }
}
