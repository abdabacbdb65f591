// ── Types ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ── Connection & Authentication ──────────────────────────────────────────────

/// Host and validated port of the session to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

/// Credentials exactly as the caller supplied them. Any combination is
/// accepted; the transport decides which ones the server takes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub key_filename: Option<PathBuf>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_filename", &self.key_filename)
            .finish()
    }
}

/// One authentication attempt made by the transport.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Nothing supplied and nothing to discover: ask the server for "none".
    None,
    Password(String),
    PrivateKey {
        path: PathBuf,
        passphrase: Option<String>,
    },
    Agent,
    /// `~/.ssh/id_*` identity files.
    DefaultKeys,
}

impl AuthMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Password(_) => "password",
            AuthMethod::PrivateKey { .. } => "publickey-file",
            AuthMethod::Agent => "agent",
            AuthMethod::DefaultKeys => "publickey-default",
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::PrivateKey { path, .. } => write!(f, "PrivateKey({})", path.display()),
            other => f.write_str(other.label()),
        }
    }
}

impl Credentials {
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        key_filename: Option<PathBuf>,
    ) -> Self {
        Self {
            username,
            password,
            key_filename,
        }
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(Some(username.into()), Some(password.into()), None)
    }

    pub fn key_file(username: impl Into<String>, key_filename: impl Into<PathBuf>) -> Self {
        Self::new(Some(username.into()), None, Some(key_filename.into()))
    }

    /// Ordered authentication chain: explicit key file (the password doubles
    /// as its passphrase), agent, default identities, then password.
    pub fn auth_methods(&self, allow_agent: bool, look_for_keys: bool) -> Vec<AuthMethod> {
        let mut methods = Vec::new();
        if let Some(ref path) = self.key_filename {
            methods.push(AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: self.password.clone(),
            });
        }
        if allow_agent {
            methods.push(AuthMethod::Agent);
        }
        if look_for_keys && self.key_filename.is_none() {
            methods.push(AuthMethod::DefaultKeys);
        }
        if let Some(ref password) = self.password {
            methods.push(AuthMethod::Password(password.clone()));
        }
        if methods.is_empty() {
            methods.push(AuthMethod::None);
        }
        methods
    }
}

// ── Session ──────────────────────────────────────────────────────────────────

/// What the transport learned while opening the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth_method: String,
    #[serde(default)]
    pub server_banner: Option<String>,
    #[serde(default)]
    pub server_fingerprint: Option<String>,
}

// ── Transfer request ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScpTransferDirection {
    Upload,
    Download,
}

/// A single put or get, built per call and handed to the copy client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub direction: ScpTransferDirection,
    pub source: String,
    pub destination: String,
    pub recursive: bool,
}

impl TransferRequest {
    pub fn upload(local_path: &str, remote_path: &str, recursive: bool) -> Self {
        Self {
            direction: ScpTransferDirection::Upload,
            source: local_path.to_string(),
            destination: remote_path.to_string(),
            recursive,
        }
    }

    pub fn download(remote_path: &str, local_path: &str, recursive: bool) -> Self {
        Self {
            direction: ScpTransferDirection::Download,
            source: remote_path.to_string(),
            destination: local_path.to_string(),
            recursive,
        }
    }

    pub fn local_path(&self) -> &str {
        match self.direction {
            ScpTransferDirection::Upload => &self.source,
            ScpTransferDirection::Download => &self.destination,
        }
    }

    pub fn remote_path(&self) -> &str {
        match self.direction {
            ScpTransferDirection::Upload => &self.destination,
            ScpTransferDirection::Download => &self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_only_chain() {
        let creds = Credentials::password("tyler", "iamateapot");
        let methods = creds.auth_methods(false, false);
        assert_eq!(methods, vec![AuthMethod::Password("iamateapot".into())]);
    }

    #[test]
    fn test_key_file_uses_password_as_passphrase() {
        let creds = Credentials::new(
            Some("tyler".into()),
            Some("secret".into()),
            Some(PathBuf::from("/keys/id_ed25519")),
        );
        let methods = creds.auth_methods(true, true);
        assert_eq!(
            methods,
            vec![
                AuthMethod::PrivateKey {
                    path: PathBuf::from("/keys/id_ed25519"),
                    passphrase: Some("secret".into()),
                },
                AuthMethod::Agent,
                AuthMethod::Password("secret".into()),
            ]
        );
    }

    #[test]
    fn test_default_keys_only_without_explicit_key() {
        let creds = Credentials::new(Some("u".into()), None, None);
        assert_eq!(
            creds.auth_methods(true, true),
            vec![AuthMethod::Agent, AuthMethod::DefaultKeys]
        );
    }

    #[test]
    fn test_nothing_supplied_falls_back_to_none() {
        let creds = Credentials::default();
        assert_eq!(creds.auth_methods(false, false), vec![AuthMethod::None]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::password("u", "hunter2");
        let dbg = format!("{:?}", creds);
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));

        let method = AuthMethod::Password("hunter2".into());
        assert_eq!(format!("{:?}", method), "password");
    }

    #[test]
    fn test_request_paths_by_direction() {
        let put = TransferRequest::upload("a.txt", "/tmp/a.txt", false);
        assert_eq!(put.local_path(), "a.txt");
        assert_eq!(put.remote_path(), "/tmp/a.txt");

        let get = TransferRequest::download("/home/u/*.txt", "local_dir/", true);
        assert_eq!(get.local_path(), "local_dir/");
        assert_eq!(get.remote_path(), "/home/u/*.txt");
        assert!(get.recursive);
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&ScpTransferDirection::Upload).unwrap();
        assert_eq!(json, "\"upload\"");
        let dir: ScpTransferDirection = serde_json::from_str("\"download\"").unwrap();
        assert_eq!(dir, ScpTransferDirection::Download);
    }
}
