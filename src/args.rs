// ── Keyword names and argument binding ────────────────────────────────────────

use scpl_scp::scp::{ScpError, ScpResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One keyword invocation as it arrives from the test runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordCall {
    pub keyword: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl KeywordCall {
    pub fn new(keyword: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            keyword: keyword.into(),
            args,
            kwargs: Map::new(),
        }
    }

    pub fn with_kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    OpenConnection,
    CloseConnection,
    PutFile,
    PutDirectory,
    GetFile,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Keyword::OpenConnection,
        Keyword::CloseConnection,
        Keyword::PutFile,
        Keyword::PutDirectory,
        Keyword::GetFile,
    ];

    /// Resolve a keyword name. Case, spaces and underscores are ignored, as
    /// is a leading `Library.` qualifier.
    pub fn from_name(name: &str) -> ScpResult<Self> {
        let bare = name.rsplit_once('.').map_or(name, |(_, k)| k);
        let wanted = normalize(bare);
        Self::ALL
            .into_iter()
            .find(|k| normalize(k.name()) == wanted)
            .ok_or_else(|| ScpError::invalid_argument(format!("No keyword with name '{}' found.", name)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Keyword::OpenConnection => "Open Connection",
            Keyword::CloseConnection => "Close Connection",
            Keyword::PutFile => "Put File",
            Keyword::PutDirectory => "Put Directory",
            Keyword::GetFile => "Get File",
        }
    }

    /// Parameter names in positional order.
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Keyword::OpenConnection => &["hostname", "port", "username", "password", "key_filename"],
            Keyword::CloseConnection => &[],
            Keyword::PutFile => &["local_filepath", "remote_filepath"],
            Keyword::PutDirectory => &["local_directory", "remote_filepath"],
            Keyword::GetFile => &["remote_filepath", "local_filepath", "recursive"],
        }
    }

    /// Merge positional and named arguments into `A`.
    pub(crate) fn bind<A: DeserializeOwned>(&self, call: &KeywordCall) -> ScpResult<A> {
        let params = self.params();
        if call.args.len() > params.len() {
            return Err(ScpError::invalid_argument(format!(
                "Keyword '{}' expected 0 to {} arguments, got {}.",
                self.name(),
                params.len(),
                call.args.len()
            )));
        }

        let mut bound: Map<String, Value> = params
            .iter()
            .zip(call.args.iter())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        for (name, value) in &call.kwargs {
            if bound.contains_key(name) {
                return Err(ScpError::invalid_argument(format!(
                    "Keyword '{}' got multiple values for argument '{}'.",
                    self.name(),
                    name
                )));
            }
            bound.insert(name.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(bound)).map_err(|e| {
            ScpError::invalid_argument(format!("Invalid arguments for '{}': {}", self.name(), e))
        })
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Argument shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OpenArgs {
    pub hostname: String,
    pub port: Option<PortArg>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub key_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoArgs {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PutFileArgs {
    pub local_filepath: String,
    pub remote_filepath: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PutDirectoryArgs {
    pub local_directory: String,
    pub remote_filepath: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GetFileArgs {
    pub remote_filepath: String,
    pub local_filepath: String,
    pub recursive: Option<FlagArg>,
}

/// Port as the runner passes it: `22` or `"22"`. Any other JSON value is
/// kept in its JSON text form so port parsing rejects it as an invalid port.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum PortArg {
    Number(i64),
    Text(String),
    Other(Value),
}

impl PortArg {
    pub fn into_text(self) -> String {
        match self {
            PortArg::Number(n) => n.to_string(),
            PortArg::Text(s) => s,
            PortArg::Other(value) => value.to_string(),
        }
    }
}

/// Boolean argument with test-runner truthiness for strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlagArg {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FlagArg {
    pub fn is_true(&self) -> bool {
        match self {
            FlagArg::Bool(b) => *b,
            FlagArg::Number(n) => *n != 0,
            FlagArg::Text(s) => !matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "no" | "off" | "0" | "none"
            ),
        }
    }
}
