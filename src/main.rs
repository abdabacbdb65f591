// JSON-lines keyword runner: one call per stdin line, one outcome per stdout line.

use scplibrary::{KeywordOutcome, ScpErrorKind, ScpLibrary, ScpLibraryConfig};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "SCPLIBRARY_CONFIG";

fn load_config() -> Result<ScpLibraryConfig, String> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            info!("Loading configuration from {}", path.to_string_lossy());
            ScpLibraryConfig::load(&path).map_err(String::from)
        }
        None => Ok(ScpLibraryConfig::default()),
    }
}

fn encode(outcome: &KeywordOutcome) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|e| {
        format!(
            r#"{{"status":"FAIL","kind":"{:?}","error":"cannot encode outcome: {}"}}"#,
            ScpErrorKind::InvalidArgument,
            e.to_string().replace('"', "'")
        )
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    let mut library = ScpLibrary::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read keyword call: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = library.run_line(&line);
        if let KeywordOutcome::Fail { kind, error } = &outcome {
            info!("Keyword failed ({:?}): {}", kind, error);
        }
        if let Err(e) = writeln!(stdout, "{}", encode(&outcome)).and_then(|_| stdout.flush()) {
            error!("Failed to write keyword outcome: {}", e);
            break;
        }
    }

    library.close_connection();
    ExitCode::SUCCESS
}
