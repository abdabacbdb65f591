// ── Transfer dispatch – liveness check, then hand off to the copy client ──────

use crate::scp::error::ScpResult;
use crate::scp::service::{CopyClient, ScpConnection, Transport};
use crate::scp::types::*;
use log::debug;

impl<T: Transport> ScpConnection<T> {
    /// Upload a single file. A directory here is left to the copy client.
    pub fn put_file(&mut self, local_path: &str, remote_path: &str) -> ScpResult<()> {
        self.dispatch(TransferRequest::upload(local_path, remote_path, false))
    }

    /// Upload the tree rooted at `local_dir_path`.
    pub fn put_directory(&mut self, local_dir_path: &str, remote_dir_path: &str) -> ScpResult<()> {
        self.dispatch(TransferRequest::upload(local_dir_path, remote_dir_path, true))
    }

    /// Download `remote_path`, which the remote shell may expand
    /// (wildcards, `$VARS`). `recursive` allows directories.
    pub fn get_file(&mut self, remote_path: &str, local_path: &str, recursive: bool) -> ScpResult<()> {
        self.dispatch(TransferRequest::download(remote_path, local_path, recursive))
    }

    fn dispatch(&mut self, request: TransferRequest) -> ScpResult<()> {
        let client = self.client_mut()?;
        debug!(
            "SCP {:?} {} -> {} (recursive={})",
            request.direction, request.source, request.destination, request.recursive
        );
        match request.direction {
            ScpTransferDirection::Upload => client.put(&request),
            ScpTransferDirection::Download => client.get(&request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scp::service::MockCopyClient;
    use crate::scp::testing::{connected_client, FakeTransport};
    use crate::scp::{Credentials, ScpError, ScpErrorKind};

    fn open_with(client: MockCopyClient) -> ScpConnection<FakeTransport> {
        let mut conn =
            ScpConnection::with_transport(FakeTransport::with_clients(vec![Ok(client)]));
        conn.open("host", "22", Credentials::password("u", "p")).unwrap();
        conn
    }

    #[test]
    fn test_transfers_while_closed_fail_not_connected() {
        let mut conn = ScpConnection::with_transport(FakeTransport::default());

        let errors = [
            conn.put_file("a.txt", "/tmp/a.txt").unwrap_err(),
            conn.put_directory("dir", "/tmp/dir").unwrap_err(),
            conn.get_file("/tmp/a.txt", "a.txt", false).unwrap_err(),
            conn.get_file("/tmp/dir", "dir", true).unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind, ScpErrorKind::NotConnected);
        }
        assert!(!conn.is_open());
        assert_eq!(conn.transport().connects, 0);
    }

    #[test]
    fn test_put_file_is_never_recursive() {
        let mut client = connected_client();
        client
            .expect_put()
            .withf(|req: &TransferRequest| {
                req.source == "a.txt" && req.destination == "/tmp/a.txt" && !req.recursive
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut conn = open_with(client);
        conn.put_file("a.txt", "/tmp/a.txt").unwrap();
    }

    #[test]
    fn test_put_directory_is_always_recursive() {
        let mut client = connected_client();
        client
            .expect_put()
            .withf(|req: &TransferRequest| {
                req.source == "fixtures" && req.destination == "/srv/fixtures" && req.recursive
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut conn = open_with(client);
        conn.put_directory("fixtures", "/srv/fixtures").unwrap();
    }

    #[test]
    fn test_get_file_forwards_recursive_flag() {
        let mut client = connected_client();
        client
            .expect_get()
            .withf(|req: &TransferRequest| req.source == "/home/u/*.txt" && !req.recursive)
            .times(1)
            .returning(|_| Ok(()));
        client
            .expect_get()
            .withf(|req: &TransferRequest| req.source == "/home/u/" && req.recursive)
            .times(1)
            .returning(|_| Ok(()));
        let mut conn = open_with(client);
        conn.get_file("/home/u/*.txt", "local_dir/", false).unwrap();
        conn.get_file("/home/u/", "local_dir/", true).unwrap();
    }

    #[test]
    fn test_get_file_passes_remote_expressions_through() {
        let mut client = connected_client();
        client
            .expect_get()
            .withf(|req: &TransferRequest| {
                req.direction == ScpTransferDirection::Download
                    && req.remote_path() == "$HOME/logs/*.log"
                    && req.local_path() == "out/"
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut conn = open_with(client);
        conn.get_file("$HOME/logs/*.log", "out/", false).unwrap();
    }

    #[test]
    fn test_failed_transfer_keeps_connection_open() {
        let mut client = connected_client();
        client
            .expect_put()
            .times(2)
            .returning(|_| Err(ScpError::transfer("scp: /readonly/a.txt: Permission denied")));
        let mut conn = open_with(client);

        let err = conn.put_file("a.txt", "/readonly/a.txt").unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::Transfer);
        assert_eq!(err.message, "scp: /readonly/a.txt: Permission denied");
        assert!(conn.is_open());

        // Retrying the same call reaches the client again.
        assert!(conn.put_file("a.txt", "/readonly/a.txt").is_err());
    }

    #[test]
    fn test_put_after_close_fails() {
        let mut client = connected_client();
        client.expect_put().times(1).returning(|_| Ok(()));
        let mut conn = open_with(client);

        conn.put_file("a.txt", "/tmp/a.txt").unwrap();
        conn.close();
        let err = conn.put_file("a.txt", "/tmp/a.txt").unwrap_err();
        assert_eq!(err.kind, ScpErrorKind::NotConnected);
    }
}
