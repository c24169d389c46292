//! Database configuration.
//!
//! Parsed from a TOML file the same way `ManifoldConfig` parses
//! `.manifold/config.toml`: unknown fields rejected, line-level detail on
//! parse failure. Unlike `ManifoldConfig`, a missing file is not defaulted —
//! `db_name`/`local_dir` have no sensible defaults, so a missing file yields
//! `None` and the caller constructs `DatabaseOptions` directly.

use std::fmt;
use std::path::{Path, PathBuf};

use gitdocdb_core::merge::ConflictStrategy;
use gitdocdb_core::model::SerializationMode;
use gitdocdb_git::Credentials;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DatabaseOptions
// ---------------------------------------------------------------------------

/// Top-level database configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseOptions {
    /// The database's logical name.
    pub db_name: String,

    /// The local directory the working tree and `.git` live under.
    pub local_dir: PathBuf,

    /// On-disk document encoding.
    #[serde(default)]
    pub serialization: SerializationMode,

    /// Prefix prepended to generated `_id`s (`_id` generation).
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// Remote connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Per-document conflict resolution policy.
    #[serde(default = "default_conflict_strategy")]
    pub conflict_resolution_strategy: ConflictStrategy,

    /// Fields whose array values are deduplicated after a document merge.
    #[serde(default)]
    pub key_of_unique_array: Vec<String>,

    /// Live-sync tick interval in milliseconds (clamped to a minimum of 3000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum fetch/push attempts.
    #[serde(default = "default_network_retry")]
    pub network_retry: u32,

    /// Delay between retry attempts, in milliseconds.
    #[serde(default = "default_network_retry_interval_ms")]
    pub network_retry_interval_ms: u64,

    /// Overall network operation timeout, in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// Whether `SyncResult.commits` is populated.
    #[serde(default)]
    pub include_commits: bool,

    /// Whether to start a periodic background sync on open.
    #[serde(default)]
    pub live: bool,

    /// Policy for a sync with no common ancestor.
    #[serde(default)]
    pub combine_db_strategy: CombineDbStrategy,
}

impl DatabaseOptions {
    /// The live-sync interval, clamped to a 3 s floor.
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms.max(3000))
    }

    /// The overall network timeout as a [`std::time::Duration`].
    #[must_use]
    pub fn network_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.network_timeout_ms)
    }

    /// The retry interval as a [`std::time::Duration`].
    #[must_use]
    pub fn network_retry_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.network_retry_interval_ms)
    }
}

impl DatabaseOptions {
    /// Build minimal options with every optional field at its documented
    /// default. The CLI uses this for `--dir`/`--db-name` invocations that
    /// don't supply a config file.
    #[must_use]
    pub fn new(db_name: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_name: db_name.into(),
            local_dir: local_dir.into(),
            serialization: SerializationMode::default(),
            name_prefix: None,
            connection: ConnectionConfig::default(),
            conflict_resolution_strategy: default_conflict_strategy(),
            key_of_unique_array: Vec::new(),
            interval_ms: default_interval_ms(),
            network_retry: default_network_retry(),
            network_retry_interval_ms: default_network_retry_interval_ms(),
            network_timeout_ms: default_network_timeout_ms(),
            include_commits: false,
            live: false,
            combine_db_strategy: CombineDbStrategy::default(),
        }
    }
}

fn default_conflict_strategy() -> ConflictStrategy {
    ConflictStrategy::OursDiff
}

const fn default_interval_ms() -> u64 {
    30_000
}

const fn default_network_retry() -> u32 {
    3
}

const fn default_network_retry_interval_ms() -> u64 {
    2_000
}

const fn default_network_timeout_ms() -> u64 {
    7_000
}

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Remote connection settings (`connection {...}`).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Which connection type this is.
    #[serde(default, rename = "type")]
    pub kind: ConnectionKind,

    /// The remote's HTTPS URL. Required for `github`/`ssh` kinds.
    #[serde(default)]
    pub url: Option<String>,

    /// HTTP basic auth token, required for `github`-kind connections unless
    /// `private` is `false`.
    #[serde(default)]
    pub personal_access_token: Option<String>,

    /// Private key path for `ssh`-kind connections.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Public key path for `ssh`-kind connections, if available.
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// Whether the remote repository is private (affects whether a token
    /// is required for `github`-kind connections).
    #[serde(default)]
    pub private: Option<bool>,
}

impl ConnectionConfig {
    /// Build the [`Credentials`] this connection implies.
    ///
    /// `github`-kind connections with no token and `private == Some(false)`
    /// fall back to [`Credentials::None`] (a public, read-only remote).
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        match self.kind {
            ConnectionKind::None => Credentials::None,
            ConnectionKind::Github => match &self.personal_access_token {
                Some(token) => Credentials::PersonalAccessToken(token.clone()),
                None => Credentials::None,
            },
            ConnectionKind::Ssh => Credentials::SshKeyPair {
                private_key_path: self.private_key_path.clone().unwrap_or_default(),
                public_key_path: self.public_key_path.clone(),
            },
        }
    }
}

/// The remote connection type (`connection.type`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// No remote configured; database is local-only.
    #[default]
    None,
    /// An HTTPS GitHub-style remote, authenticated by personal access token.
    Github,
    /// An SSH remote, authenticated by key pair.
    Ssh,
}

// ---------------------------------------------------------------------------
// CombineDbStrategy
// ---------------------------------------------------------------------------

/// Policy for a sync that finds no common ancestor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineDbStrategy {
    /// Join the two histories with a synthetic commit.
    CombineHeadWithTheirs,
    /// Surface [`gitdocdb_core::CoreError::NoMergeBaseFound`].
    #[default]
    Throw,
    /// Emit an empty (nop) result without touching history.
    Nop,
}

impl CombineDbStrategy {
    /// Convert to the engine-level [`gitdocdb_core::sync::NoMergeBaseBehavior`].
    ///
    /// Folds this option together with Open Question (a)'s
    /// `behaviorForNoMergeBase` into the single engine-level enum — see
    /// `DESIGN.md` for the reasoning.
    #[must_use]
    pub fn to_engine_behavior(self) -> gitdocdb_core::sync::NoMergeBaseBehavior {
        match self {
            Self::CombineHeadWithTheirs => gitdocdb_core::sync::NoMergeBaseBehavior::Combine,
            Self::Throw => gitdocdb_core::sync::NoMergeBaseBehavior::Fail,
            Self::Nop => gitdocdb_core::sync::NoMergeBaseBehavior::Nop,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a database configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded, if available.
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl DatabaseOptions {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on I/O errors (other than not-found) or parse
    /// errors. A missing file is not an error — callers should construct
    /// [`DatabaseOptions`] directly in that case, since `db_name`/`local_dir`
    /// have no sensible defaults.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map(Some).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on invalid TOML, unknown fields, or a missing
    /// required field (`db_name`, `local_dir`).
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start].chars().filter(|&c| c == '\n').count() + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError { path: None, message }
        })
    }
}
