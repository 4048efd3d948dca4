//! Configuration for the `dailytask` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/dailytask/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dailytask_proto::tag::{ParseTagError, TriggerTag};

use crate::classifier::KeywordRules;
use crate::pipeline::ProofMode;
use crate::session::Session;
use crate::workflow::WorkflowConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A `[classifier.keywords]` entry names a tag that does not exist.
    #[error("invalid classifier keywords: {0}")]
    UnknownTag(#[from] ParseTagError),

    /// A numeric setting is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Name of the offending key.
        key: &'static str,
        /// Why it was refused.
        reason: &'static str,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    session: SessionFileConfig,
    workflow: WorkflowFileConfig,
    classifier: ClassifierFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    proof_mode: Option<ProofMode>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    user_id: Option<String>,
}

/// `[workflow]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct WorkflowFileConfig {
    event_buffer: Option<usize>,
}

/// `[classifier]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ClassifierFileConfig {
    /// Tag name -> keyword list; each entry replaces that tag's list.
    keywords: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task backend.
    pub base_url: String,
    /// Limit for every remote call.
    pub request_timeout: Duration,
    /// Route used for proof submission.
    pub proof_mode: ProofMode,
    /// Signed-in user, required for profile-bound commands.
    pub user_id: Option<String>,
    /// Capacity of the workflow event channel.
    pub event_buffer: usize,
    /// Classifier keyword table.
    pub keyword_rules: KeywordRules,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            proof_mode: ProofMode::Split,
            user_id: None,
            event_buffer: 64,
            keyword_rules: KeywordRules::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or if a value in it is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let request_timeout = cli
            .timeout_secs
            .or(file.api.request_timeout_secs)
            .map_or(defaults.request_timeout, Duration::from_secs);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be at least 1",
            });
        }

        let event_buffer = file.workflow.event_buffer.unwrap_or(defaults.event_buffer);
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_buffer",
                reason: "must be at least 1",
            });
        }

        let mut keyword_rules = defaults.keyword_rules;
        for (tag, words) in &file.classifier.keywords {
            let tag: TriggerTag = tag.parse()?;
            keyword_rules = keyword_rules.with_keywords(tag, words);
        }

        Ok(Self {
            base_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.base_url),
            request_timeout,
            proof_mode: cli
                .proof_mode
                .or(file.api.proof_mode)
                .unwrap_or(defaults.proof_mode),
            user_id: cli
                .user_id
                .clone()
                .or_else(|| file.session.user_id.clone()),
            event_buffer,
            keyword_rules,
        })
    }

    /// The session for the configured user, if one is set.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(Session::new)
    }

    /// Settings for a [`WorkflowController`](crate::workflow::WorkflowController).
    #[must_use]
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            request_timeout: self.request_timeout,
            proof_mode: self.proof_mode,
            event_buffer: self.event_buffer,
            keyword_rules: self.keyword_rules.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Daily recovery tasks with photo proof")]
pub struct CliArgs {
    /// Base URL of the task backend.
    #[arg(long, env = "DAILYTASK_API_URL")]
    pub api_url: Option<String>,

    /// Your user id.
    #[arg(long, env = "DAILYTASK_USER_ID")]
    pub user_id: Option<String>,

    /// Proof route: `split` (upload, then verify) or `combined`.
    #[arg(long, env = "DAILYTASK_PROOF_MODE")]
    pub proof_mode: Option<ProofMode>,

    /// Timeout for each remote call, in seconds.
    #[arg(long, env = "DAILYTASK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Path to config file (default: `~/.config/dailytask/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "DAILYTASK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/dailytask.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands of the `dailytask` binary.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the trigger tags detected in mood text.
    Classify {
        /// How you are feeling.
        #[arg(long)]
        text: String,
    },
    /// List pending tasks and the current streak.
    Tasks,
    /// Ask for a new task: from mood text, or from your profile without it.
    Suggest {
        /// How you are feeling.
        #[arg(long)]
        text: Option<String>,
    },
    /// Submit a photo as proof for a pending task.
    Submit {
        /// Id of the task.
        #[arg(long)]
        task_id: String,
        /// Path to the photo.
        #[arg(long)]
        photo: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("dailytask").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
