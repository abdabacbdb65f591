//! Scripted transport for unit tests.

use crate::scp::error::{ScpError, ScpResult};
use crate::scp::service::{MockCopyClient, OpenedSession, Transport};
use crate::scp::types::*;
use std::collections::VecDeque;

#[derive(Default)]
pub(crate) struct FakeTransport {
    pub clients: VecDeque<ScpResult<MockCopyClient>>,
    pub connects: usize,
    pub last_target: Option<ConnectionTarget>,
    pub last_credentials: Option<Credentials>,
}

impl FakeTransport {
    pub fn with_clients(clients: Vec<ScpResult<MockCopyClient>>) -> Self {
        Self {
            clients: clients.into(),
            ..Self::default()
        }
    }
}

impl Transport for FakeTransport {
    type Client = MockCopyClient;

    fn connect(
        &mut self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> ScpResult<OpenedSession<MockCopyClient>> {
        self.connects += 1;
        self.last_target = Some(target.clone());
        self.last_credentials = Some(credentials.clone());
        let client = self
            .clients
            .pop_front()
            .unwrap_or_else(|| Err(ScpError::transport("no scripted session left")))?;
        Ok(OpenedSession {
            client,
            info: ConnectionInfo {
                host: target.host.clone(),
                port: target.port,
                username: credentials.username.clone().unwrap_or_default(),
                auth_method: "password".into(),
                server_banner: None,
                server_fingerprint: Some("SHA256:fake".into()),
            },
        })
    }
}

/// A client that expects to be closed exactly once and nothing else.
pub(crate) fn connected_client() -> MockCopyClient {
    let mut client = MockCopyClient::new();
    client.expect_close().times(1).returning(|| Ok(()));
    client
}
