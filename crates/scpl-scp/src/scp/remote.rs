// ── Remote shell helpers used by the copy client ──────────────────────────────

use crate::scp::error::{ScpError, ScpResult};
use log::debug;
use ssh2::Session;
use std::io::Read;

pub(crate) struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

/// A path produced by remote expansion or a remote walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteEntry {
    pub path: String,
    pub is_dir: bool,
}

/// Run `command` through the remote user's shell and collect its output.
pub(crate) fn exec(session: &Session, command: &str) -> ScpResult<RemoteOutput> {
    debug!("SCP remote exec: {}", command);
    let mut channel = session
        .channel_session()
        .map_err(|e| ScpError::transfer(format!("Failed to open channel: {}", e)))?;
    channel
        .exec(command)
        .map_err(|e| ScpError::transfer(format!("Failed to execute '{}': {}", command, e)))?;

    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| ScpError::transfer(format!("Failed to read command output: {}", e)))?;
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).ok();
    channel.wait_close().ok();
    let exit_status = channel
        .exit_status()
        .map_err(|e| ScpError::transfer(format!("Failed to get exit status: {}", e)))?;

    Ok(RemoteOutput {
        stdout,
        stderr,
        exit_status,
    })
}

pub(crate) fn is_dir(session: &Session, path: &str) -> ScpResult<bool> {
    Ok(exec(session, &format!("test -d {}", shell_escape(path)))?.exit_status == 0)
}

pub(crate) fn mkdir_p(session: &Session, path: &str) -> ScpResult<()> {
    let out = exec(session, &format!("mkdir -p {}", shell_escape(path)))?;
    if out.exit_status != 0 {
        return Err(ScpError::transfer(format!(
            "mkdir {}: {}",
            path,
            out.stderr.trim()
        )));
    }
    Ok(())
}

/// Let the remote shell expand `pattern` (unquoted on purpose) and report
/// which of the results exist, and whether each is a directory.
pub(crate) fn expand(session: &Session, pattern: &str) -> ScpResult<Vec<RemoteEntry>> {
    let command = format!(
        "for p in {}; do if [ -d \"$p\" ]; then printf 'd %s\\n' \"$p\"; \
         elif [ -e \"$p\" ]; then printf 'f %s\\n' \"$p\"; fi; done",
        pattern
    );
    Ok(parse_entries(&exec(session, &command)?.stdout))
}

/// Entries found below a remote root, plus the paths `find` could not read.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RemoteListing {
    pub entries: Vec<RemoteEntry>,
    pub errors: Vec<String>,
}

/// Every directory and non-directory below `root`, excluding `root` itself.
/// Unreadable subdirectories are reported in `errors` instead of failing the
/// whole listing.
pub(crate) fn walk(session: &Session, root: &str) -> ScpResult<RemoteListing> {
    let escaped = shell_escape(root);
    let command = format!(
        "find {0} -type d -exec printf 'd %s\\n' {{}} + ; find {0} ! -type d -exec printf 'f %s\\n' {{}} +",
        escaped
    );
    parse_listing(root, &exec(session, &command)?)
}

fn parse_listing(root: &str, out: &RemoteOutput) -> ScpResult<RemoteListing> {
    let mut entries = parse_entries(&out.stdout);
    let errors: Vec<String> = out
        .stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    // The root itself is listed whenever it is readable.
    let before = entries.len();
    entries.retain(|e| e.path != root);
    if entries.len() == before && out.exit_status != 0 {
        return Err(ScpError::transfer(format!(
            "Cannot list remote directory '{}': {}",
            root,
            errors.join("; ")
        )));
    }
    Ok(RemoteListing { entries, errors })
}

fn parse_entries(output: &str) -> Vec<RemoteEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (kind, path) = line.split_once(' ')?;
            if path.is_empty() {
                return None;
            }
            Some(RemoteEntry {
                path: path.to_string(),
                is_dir: kind == "d",
            })
        })
        .collect()
}

// ── Remote path helpers ──────────────────────────────────────────────────────

pub(crate) fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Strip trailing slashes, keeping a bare `/`.
pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

pub(crate) fn basename(path: &str) -> &str {
    let trimmed = trim_trailing_slash(path);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

pub(crate) fn join(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// `path` relative to `root`, without a leading slash.
pub(crate) fn relative<'a>(root: &str, path: &'a str) -> &'a str {
    path.strip_prefix(root)
        .unwrap_or(path)
        .trim_start_matches('/')
}
