//! Test-automation keywords over a single SCP connection.

use crate::args::*;
use scpl_scp::scp::{
    Credentials, ScpConnection, ScpErrorKind, ScpLibraryConfig, ScpResult, SshTransport, Transport,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_PORT: &str = "22";

/// Result of one keyword, in the shape the runner reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum KeywordOutcome {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail { kind: ScpErrorKind, error: String },
}

impl KeywordOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, KeywordOutcome::Pass)
    }
}

impl From<ScpResult<()>> for KeywordOutcome {
    fn from(result: ScpResult<()>) -> Self {
        match result {
            Ok(()) => KeywordOutcome::Pass,
            Err(e) => KeywordOutcome::Fail {
                kind: e.kind,
                error: e.message,
            },
        }
    }
}

/// Keyword facade. Owns exactly one connection; not shared between threads.
pub struct ScpLibrary<T: Transport = SshTransport> {
    connection: ScpConnection<T>,
}

impl ScpLibrary<SshTransport> {
    pub fn new(config: ScpLibraryConfig) -> Self {
        Self {
            connection: ScpConnection::new(config),
        }
    }
}

impl Default for ScpLibrary<SshTransport> {
    fn default() -> Self {
        Self::new(ScpLibraryConfig::default())
    }
}

impl<T: Transport> ScpLibrary<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            connection: ScpConnection::with_transport(transport),
        }
    }

    pub fn connection(&self) -> &ScpConnection<T> {
        &self.connection
    }

    // ── Keywords ─────────────────────────────────────────────────────────────

    /// Open Connection. `port` defaults to 22.
    pub fn open_connection(
        &mut self,
        hostname: &str,
        port: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        key_filename: Option<&str>,
    ) -> ScpResult<()> {
        let credentials = Credentials::new(
            username.map(str::to_string),
            password.map(str::to_string),
            key_filename.map(PathBuf::from),
        );
        self.connection
            .open(hostname, port.unwrap_or(DEFAULT_PORT), credentials)
    }

    pub fn close_connection(&mut self) {
        self.connection.close();
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    pub fn put_file(&mut self, local_filepath: &str, remote_filepath: &str) -> ScpResult<()> {
        self.connection.put_file(local_filepath, remote_filepath)
    }

    pub fn put_directory(&mut self, local_directory: &str, remote_filepath: &str) -> ScpResult<()> {
        self.connection.put_directory(local_directory, remote_filepath)
    }

    pub fn get_file(
        &mut self,
        remote_filepath: &str,
        local_filepath: &str,
        recursive: bool,
    ) -> ScpResult<()> {
        self.connection
            .get_file(remote_filepath, local_filepath, recursive)
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    pub fn run_keyword(&mut self, call: &KeywordCall) -> KeywordOutcome {
        self.execute(call).into()
    }

    /// Decode one JSON keyword call and run it.
    pub fn run_line(&mut self, line: &str) -> KeywordOutcome {
        match serde_json::from_str::<KeywordCall>(line) {
            Ok(call) => self.run_keyword(&call),
            Err(e) => KeywordOutcome::Fail {
                kind: ScpErrorKind::InvalidArgument,
                error: format!("Malformed keyword call: {}", e),
            },
        }
    }

    fn execute(&mut self, call: &KeywordCall) -> ScpResult<()> {
        let keyword = Keyword::from_name(&call.keyword)?;
        log::debug!("Running keyword '{}'", keyword.name());
        match keyword {
            Keyword::OpenConnection => {
                let args: OpenArgs = keyword.bind(call)?;
                let port = args.port.map(PortArg::into_text);
                self.open_connection(
                    &args.hostname,
                    port.as_deref(),
                    args.username.as_deref(),
                    args.password.as_deref(),
                    args.key_filename.as_deref(),
                )
            }
            Keyword::CloseConnection => {
                let _: NoArgs = keyword.bind(call)?;
                self.close_connection();
                Ok(())
            }
            Keyword::PutFile => {
                let args: PutFileArgs = keyword.bind(call)?;
                self.put_file(&args.local_filepath, &args.remote_filepath)
            }
            Keyword::PutDirectory => {
                let args: PutDirectoryArgs = keyword.bind(call)?;
                self.put_directory(&args.local_directory, &args.remote_filepath)
            }
            Keyword::GetFile => {
                let args: GetFileArgs = keyword.bind(call)?;
                let recursive = args.recursive.map_or(false, |flag| flag.is_true());
                self.get_file(&args.remote_filepath, &args.local_filepath, recursive)
            }
        }
    }
}
