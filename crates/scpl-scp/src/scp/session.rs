// ── SshTransport – ssh2 connect, host-key policy, authentication ─────────────

use crate::scp::client::SshCopyClient;
use crate::scp::config::{HostKeyPolicy, ScpLibraryConfig};
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::service::{OpenedSession, Transport};
use crate::scp::types::*;
use base64::Engine;
use log::{debug, info, warn};
use ssh2::{CheckResult, KnownHostFileKind, Session};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IDENTITIES: [&str; 4] = ["id_ed25519", "id_rsa", "id_ecdsa", "id_dsa"];

/// Transport allocated at facade creation; unauthenticated until `connect`.
pub struct SshTransport {
    config: ScpLibraryConfig,
}

impl SshTransport {
    pub fn new(config: ScpLibraryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScpLibraryConfig {
        &self.config
    }

    // ── TCP ──────────────────────────────────────────────────────────────────

    fn open_tcp(&self, target: &ConnectionTarget) -> ScpResult<TcpStream> {
        let addr = format!("{}:{}", target.host, target.port);
        let Some(secs) = self.config.connect_timeout_secs else {
            return TcpStream::connect(&addr)
                .map_err(|e| ScpError::transport(format!("TCP connection to {} failed: {}", addr, e)));
        };

        let resolved = addr
            .to_socket_addrs()
            .map_err(|e| ScpError::transport(format!("Cannot resolve '{}': {}", addr, e)))?;
        let mut last_error = None;
        for sock in resolved {
            match TcpStream::connect_timeout(&sock, Duration::from_secs(secs)) {
                Ok(tcp) => return Ok(tcp),
                Err(e) => last_error = Some(e),
            }
        }
        Err(ScpError::transport(match last_error {
            Some(e) => format!("TCP connection to {} failed: {}", addr, e),
            None => format!("DNS returned no addresses for {}", target.host),
        }))
    }

    // ── Host key ─────────────────────────────────────────────────────────────

    fn verify_host_key(&self, session: &Session, target: &ConnectionTarget) -> ScpResult<()> {
        let (key, _) = session
            .host_key()
            .ok_or_else(|| ScpError::transport("Server did not present a host key"))?;

        if self.config.host_key_policy == HostKeyPolicy::AutoAdd {
            debug!("SCP auto-accepting host key for {}", target.host);
            return Ok(());
        }

        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| ScpError::transport(format!("Cannot initialise known hosts: {}", e)))?;
        if let Some(path) = self.config.known_hosts_file().filter(|p| p.exists()) {
            if let Err(e) = known_hosts.read_file(&path, KnownHostFileKind::OpenSSH) {
                warn!("SCP could not read {}: {}", path.display(), e);
            }
        }

        let check = if target.port == 22 {
            known_hosts.check(&target.host, key)
        } else {
            known_hosts.check_port(&target.host, target.port, key)
        };

        match check {
            CheckResult::Match => Ok(()),
            CheckResult::Mismatch => Err(ScpError::host_key_rejected(format!(
                "Host key for {} does not match the known_hosts entry",
                target.host
            ))),
            CheckResult::NotFound if self.config.host_key_policy == HostKeyPolicy::Warn => {
                warn!("SCP accepting unknown host key for {}", target.host);
                Ok(())
            }
            CheckResult::NotFound => Err(ScpError::host_key_rejected(format!(
                "Server '{}' not found in known_hosts",
                target.host
            ))),
            CheckResult::Failure => Err(ScpError::transport(format!(
                "Host key check for {} failed",
                target.host
            ))),
        }
    }

    // ── Authentication ───────────────────────────────────────────────────────

    fn authenticate(
        &self,
        session: &Session,
        username: &str,
        methods: &[AuthMethod],
    ) -> ScpResult<String> {
        for method in methods {
            let accepted = match method {
                AuthMethod::None => {
                    // Listing methods performs the "none" request.
                    match session.auth_methods(username) {
                        Ok(listed) => debug!(
                            "SCP server offers [{}] to {}",
                            offered_methods(listed).join(", "),
                            username
                        ),
                        Err(e) => debug!("SCP auth method listing for {} failed: {}", username, e),
                    }
                    session.authenticated()
                }
                AuthMethod::PrivateKey { path, passphrase } => session
                    .userauth_pubkey_file(username, None, path, passphrase.as_deref())
                    .is_ok(),
                AuthMethod::Agent => session.userauth_agent(username).is_ok(),
                AuthMethod::DefaultKeys => {
                    if let Some(key) = default_identities()
                        .into_iter()
                        .find(|key| session.userauth_pubkey_file(username, None, key, None).is_ok())
                    {
                        debug!("SCP default identity {} accepted", key.display());
                    }
                    session.authenticated()
                }
                AuthMethod::Password(password) => {
                    session.userauth_password(username, password).is_ok()
                }
            };

            if accepted && session.authenticated() {
                return Ok(method.label().to_string());
            }
            warn!("SCP {} auth failed for {}", method.label(), username);
        }

        Err(ScpError::authentication(format!(
            "All authentication methods exhausted for user '{}'",
            username
        )))
    }
}

impl Transport for SshTransport {
    type Client = SshCopyClient;

    fn connect(
        &mut self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> ScpResult<OpenedSession<SshCopyClient>> {
        info!("SCP connecting to {}:{}", target.host, target.port);
        let tcp = self.open_tcp(target)?;

        let mut session = Session::new()
            .map_err(|e| ScpError::transport(format!("Failed to create SSH session: {}", e)))?;
        session.set_compress(self.config.compress);
        if let Some(secs) = self.config.connect_timeout_secs {
            session.set_timeout(secs.saturating_mul(1000).min(u32::MAX as u64) as u32);
        }
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ScpError::transport(format!("SSH handshake failed: {}", e)))?;

        let banner = session.banner().map(|b| b.to_string());
        let fingerprint = session.host_key_hash(ssh2::HashType::Sha256).map(|bytes| {
            format!(
                "SHA256:{}",
                base64::engine::general_purpose::STANDARD_NO_PAD.encode(bytes)
            )
        });
        self.verify_host_key(&session, target)?;

        let username = credentials
            .username
            .clone()
            .or_else(local_username)
            .ok_or_else(|| {
                ScpError::authentication("No username given and the local user name is unknown")
            })?;
        let methods = credentials.auth_methods(self.config.allow_agent, self.config.look_for_keys);
        let auth_method = self.authenticate(&session, &username, &methods)?;

        // Transfers block without limit once authenticated.
        session.set_timeout(0);
        info!("SCP authenticated to {} via {}", target.host, auth_method);

        Ok(OpenedSession {
            client: SshCopyClient::new(session),
            info: ConnectionInfo {
                host: target.host.clone(),
                port: target.port,
                username,
                auth_method,
                server_banner: banner,
                server_fingerprint: fingerprint,
            },
        })
    }
}

fn local_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}

fn offered_methods(listed: &str) -> Vec<&str> {
    listed
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect()
}

fn default_identities() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| {
            let ssh_dir = home.join(".ssh");
            DEFAULT_IDENTITIES
                .iter()
                .map(|name| ssh_dir.join(name))
                .filter(|path| path.exists())
                .collect()
        })
        .unwrap_or_default()
}
