// ── scpl-scp / scp module ─────────────────────────────────────────────────────
//
// One SSH session, one SCP client bound to it:
//   • ScpConnection – open / close / is_open state machine (service.rs)
//   • Transfer dispatch – put file / put directory / get file (transfer.rs)
//   • SshTransport – ssh2 handshake, host-key policy, auth chain (session.rs)
//   • SshCopyClient – scp_send / scp_recv with scp(1) target rules (client.rs)

pub mod types;
pub mod error;
pub mod config;
pub mod service;
pub mod transfer;
pub mod session;
pub mod client;
pub(crate) mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use types::*;
pub use error::*;
pub use config::*;
pub use service::{parse_port, CopyClient, OpenedSession, ScpConnection, Transport};
pub use session::SshTransport;
pub use client::SshCopyClient;
