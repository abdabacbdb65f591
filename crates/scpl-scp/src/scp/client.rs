// ── SshCopyClient – scp_send / scp_recv with scp(1) target rules ──────────────

use crate::scp::error::{ScpError, ScpResult};
use crate::scp::remote::{self, RemoteEntry};
use crate::scp::service::CopyClient;
use crate::scp::types::*;
use log::{info, warn};
use ssh2::{Channel, Session};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// SCP client bound to one authenticated session.
pub struct SshCopyClient {
    session: Session,
}

impl SshCopyClient {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    // ── Single file ──────────────────────────────────────────────────────────

    fn upload_file(&self, local: &Path, remote_path: &str) -> ScpResult<u64> {
        let metadata = fs::metadata(local).map_err(|e| {
            ScpError::io(format!("Cannot read local file '{}': {}", local.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ScpError::transfer(format!(
                "{}: not a regular file",
                local.display()
            )));
        }
        let mut file = File::open(local)
            .map_err(|e| ScpError::io(format!("Cannot open '{}': {}", local.display(), e)))?;

        let mut channel = self
            .session
            .scp_send(Path::new(remote_path), file_mode(&metadata), metadata.len(), None)
            .map_err(|e| ScpError::transfer(format!("scp: {}: {}", remote_path, e)))?;
        let sent = io::copy(&mut file, &mut channel)
            .map_err(|e| ScpError::transfer(format!("SCP write to '{}' failed: {}", remote_path, e)))?;
        finish_send(channel)
            .map_err(|e| ScpError::transfer(format!("scp: {}: {}", remote_path, e)))?;

        info!("SCP uploaded {} bytes to {}", sent, remote_path);
        Ok(sent)
    }

    fn download_file(&self, remote_path: &str, local: &Path) -> ScpResult<u64> {
        let (mut channel, stat) = self
            .session
            .scp_recv(Path::new(remote_path))
            .map_err(|e| ScpError::transfer(format!("scp: {}: {}", remote_path, e)))?;
        let expected = stat.size();

        let mut file = File::create(local)
            .map_err(|e| ScpError::io(format!("Cannot create '{}': {}", local.display(), e)))?;
        let received = io::copy(&mut (&mut channel).take(expected), &mut file)
            .map_err(|e| ScpError::transfer(format!("SCP read of '{}' failed: {}", remote_path, e)))?;
        file.flush()?;

        channel.send_eof().ok();
        channel.wait_eof().ok();
        channel.close().ok();
        channel.wait_close().ok();

        if received < expected {
            return Err(ScpError::transfer(format!(
                "scp: {}: short read ({} of {} bytes)",
                remote_path, received, expected
            )));
        }
        apply_mode(local, stat.mode());

        info!("SCP downloaded {} bytes from {}", received, remote_path);
        Ok(received)
    }

    // ── Recursive ────────────────────────────────────────────────────────────

    fn upload_tree(&self, local_root: &Path, remote_root: &str) -> ScpResult<()> {
        if fs::metadata(local_root)?.is_file() {
            return self.upload_file(local_root, remote_root).map(|_| ());
        }
        remote::mkdir_p(&self.session, remote_root)?;

        let mut errors = Vec::new();
        // Parents are yielded before their children.
        for entry in WalkDir::new(local_root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(e.to_string());
                    continue;
                }
            };
            let relative = entry
                .path()
                .strip_prefix(local_root)
                .map_err(|e| ScpError::io(format!("Path strip error: {}", e)))?;
            let remote_path = remote::join(
                remote_root,
                &relative.to_string_lossy().replace('\\', "/"),
            );

            let result = if entry.file_type().is_dir() {
                remote::mkdir_p(&self.session, &remote_path)
            } else {
                self.upload_file(entry.path(), &remote_path).map(|_| ())
            };
            if let Err(e) = result {
                warn!("SCP dir upload: failed '{}': {}", entry.path().display(), e.message);
                errors.push(e.message);
            }
        }

        collect_errors(errors, local_root.display())
    }

    fn download_tree(&self, remote_root: &str, local_root: &Path) -> ScpResult<()> {
        let root = remote::trim_trailing_slash(remote_root);
        let listing = remote::walk(&self.session, root)?;
        fs::create_dir_all(local_root).map_err(|e| {
            ScpError::io(format!("Cannot create '{}': {}", local_root.display(), e))
        })?;

        let mut errors = listing.errors;
        let (mut dirs, files): (Vec<_>, Vec<_>) = listing.entries.iter().partition(|e| e.is_dir);
        dirs.sort_by(|a, b| a.path.cmp(&b.path));
        for dir in dirs {
            let local_dir = local_root.join(remote::relative(root, &dir.path));
            if let Err(e) = fs::create_dir_all(&local_dir) {
                errors.push(format!("mkdir {}: {}", local_dir.display(), e));
            }
        }
        for file in files {
            let local_file = local_root.join(remote::relative(root, &file.path));
            if let Err(e) = self.download_file(&file.path, &local_file) {
                warn!("SCP dir download: failed '{}': {}", file.path, e.message);
                errors.push(e.message);
            }
        }

        collect_errors(errors, root)
    }
}

impl CopyClient for SshCopyClient {
    fn put(&mut self, request: &TransferRequest) -> ScpResult<()> {
        let local = Path::new(&request.source);
        let destination_is_dir = remote::is_dir(&self.session, &request.destination)?;
        let target = put_target(&request.destination, destination_is_dir, local)?;

        if request.recursive {
            self.upload_tree(local, &target)
        } else {
            self.upload_file(local, &target).map(|_| ())
        }
    }

    fn get(&mut self, request: &TransferRequest) -> ScpResult<()> {
        let matches = remote::expand(&self.session, &request.source)?;
        let local_is_dir = Path::new(&request.destination).is_dir();

        let mut errors = Vec::new();
        for step in plan_get(request, &matches, local_is_dir)? {
            let result = match step {
                GetStep::File { remote: source, local: target } => {
                    self.download_file(&source, &target).map(|_| ())
                }
                GetStep::Tree { remote: source, local: target } => {
                    self.download_tree(&source, &target)
                }
                GetStep::Skip(reason) => Err(ScpError::transfer(reason)),
            };
            if let Err(e) = result {
                warn!("SCP get of '{}': {}", request.source, e.message);
                errors.push(e.message);
            }
        }

        collect_errors(errors, &request.source)
    }

    fn close(&mut self) -> ScpResult<()> {
        self.session
            .disconnect(None, "Client disconnecting", None)?;
        Ok(())
    }
}

// ── Target resolution ────────────────────────────────────────────────────────

/// Where a put lands: inside `destination` when it is an existing directory.
fn put_target(destination: &str, destination_is_dir: bool, local: &Path) -> ScpResult<String> {
    if destination_is_dir {
        Ok(remote::join(destination, &local_name(local)?))
    } else {
        Ok(destination.to_string())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum GetStep {
    File { remote: String, local: PathBuf },
    Tree { remote: String, local: PathBuf },
    Skip(String),
}

/// Decide what to do with each remote match of a get.
fn plan_get(
    request: &TransferRequest,
    matches: &[RemoteEntry],
    local_is_dir: bool,
) -> ScpResult<Vec<GetStep>> {
    if matches.is_empty() {
        return Err(ScpError::transfer(format!(
            "scp: {}: No such file or directory",
            request.source
        )));
    }
    if matches.len() > 1 && !local_is_dir {
        return Err(ScpError::transfer(format!(
            "{}: Not a directory ({} remote matches)",
            request.destination,
            matches.len()
        )));
    }

    let local = Path::new(&request.destination);
    Ok(matches
        .iter()
        .map(|entry| {
            let target = if local_is_dir {
                local.join(remote::basename(&entry.path))
            } else {
                local.to_path_buf()
            };
            match (entry.is_dir, request.recursive) {
                (true, true) => GetStep::Tree {
                    remote: entry.path.clone(),
                    local: target,
                },
                (true, false) => GetStep::Skip(format!("scp: {}: not a regular file", entry.path)),
                (false, _) => GetStep::File {
                    remote: entry.path.clone(),
                    local: target,
                },
            }
        })
        .collect())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn finish_send(mut channel: Channel) -> Result<(), ssh2::Error> {
    channel.send_eof()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()
}

/// Final path component of a local path, resolving `.` and `..`.
fn local_name(local: &Path) -> ScpResult<String> {
    if let Some(name) = local.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let canonical = local
        .canonicalize()
        .map_err(|e| ScpError::io(format!("Cannot resolve '{}': {}", local.display(), e)))?;
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ScpError::transfer(format!("{}: cannot derive a file name", local.display())))
}

fn collect_errors(errors: Vec<String>, context: impl std::fmt::Display) -> ScpResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ScpError::transfer(format!(
        "{} error(s) transferring {}: {}",
        errors.len(),
        context,
        errors.join("; ")
    )))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> i32 {
    use std::os::unix::fs::PermissionsExt;
    (metadata.permissions().mode() & 0o777) as i32
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> i32 {
    0o644
}

#[cfg(unix)]
fn apply_mode(local: &Path, mode: i32) {
    use std::os::unix::fs::PermissionsExt;
    let mode = (mode as u32) & 0o777;
    if mode != 0 {
        if let Err(e) = fs::set_permissions(local, fs::Permissions::from_mode(mode)) {
            warn!("SCP could not set mode {:o} on {}: {}", mode, local.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn apply_mode(_local: &Path, _mode: i32) {}
