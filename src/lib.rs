//! # scplibrary
//!
//! Keyword-style SCP facade for test automation:
//!   • Open Connection / Close Connection on exactly one host
//!   • Put File, Put Directory (recursive)
//!   • Get File, with remote wildcard expansion and optional recursion
//!
//! The SSH/SCP machinery lives in the `scpl-scp` crate; this crate adds
//! keyword dispatch and the `scplibrary` JSON-lines runner.

mod args;
pub mod keywords;

pub use args::{Keyword, KeywordCall};
pub use keywords::{KeywordOutcome, ScpLibrary};
pub use scpl_scp::scp::{
    parse_port, ConnectionInfo, ConnectionTarget, CopyClient, Credentials, HostKeyPolicy,
    OpenedSession, ScpConnection, ScpError, ScpErrorKind, ScpLibraryConfig, ScpResult,
    SshTransport, TransferRequest, ScpTransferDirection, Transport,
};
