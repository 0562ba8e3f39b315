// crates/gait-cli/src/config.rs
// ============================================================================
// Module: Process Configuration
// Description: Typed, validated process-level configuration layered over
//              defaults from an optional TOML file.
// Purpose: Keep working directory, signing posture, and timeout knobs in one
//          place instead of threading ad hoc flags through every command.
// Dependencies: gait-signer, serde, toml
// ============================================================================

//! ## Overview
//! [`GaitConfig`] has a `Default` impl for every field and is never read
//! implicitly: each command receives it (or the pieces of it it needs)
//! explicitly as an argument. A `--config` path, when given, is parsed as
//! TOML and its fields override the defaults one at a time; an absent path
//! or an absent field both fall back to [`GaitConfig::default`].

use std::path::Path;
use std::path::PathBuf;

use gait_signer::SigningMode;
use serde::Deserialize;

/// Process-level configuration, loaded from an optional TOML file and
/// layered over defaults.
///
/// The hash algorithm is not a field here: it is fixed at SHA-256 throughout
/// the gait crates and is not a configurable knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaitConfig {
    /// Root directory commands resolve relative paths against.
    pub working_dir: PathBuf,
    /// Default signing mode for commands that accept one.
    pub signing_mode: SigningMode,
    /// Maximum time a lock-style resource (e.g. a staged fixture directory)
    /// may be waited on before a command gives up.
    pub lock_deadline_secs: u64,
    /// Maximum time a credential broker subprocess may run before it is
    /// treated as timed out.
    pub broker_timeout_secs: u64,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self { working_dir: PathBuf::from("."), signing_mode: SigningMode::Dev, lock_deadline_secs: 30, broker_timeout_secs: 5 }
    }
}

/// On-disk shape of a config file: every field optional, so a partial file
/// only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
struct GaitConfigFile {
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default)]
    signing_mode: Option<SigningMode>,
    #[serde(default)]
    lock_deadline_secs: Option<u64>,
    #[serde(default)]
    broker_timeout_secs: Option<u64>,
}

/// A config file could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file's contents are not valid TOML, or do not match the
    /// expected shape.
    #[error("could not parse config file {path}: {source}")]
    Malformed {
        /// The path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

impl GaitConfig {
    /// Loads configuration from `path`, when given, layered over
    /// [`GaitConfig::default`]. A `None` path yields the defaults unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if `path` is given but cannot be read,
    /// and [`ConfigError::Malformed`] if its contents are not valid TOML
    /// matching the expected shape.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let file: GaitConfigFile =
            toml::from_str(&text).map_err(|source| ConfigError::Malformed { path: path.to_path_buf(), source })?;

        let defaults = Self::default();
        Ok(Self {
            working_dir: file.working_dir.unwrap_or(defaults.working_dir),
            signing_mode: file.signing_mode.unwrap_or(defaults.signing_mode),
            lock_deadline_secs: file.lock_deadline_secs.unwrap_or(defaults.lock_deadline_secs),
            broker_timeout_secs: file.broker_timeout_secs.unwrap_or(defaults.broker_timeout_secs),
        })
    }
}
