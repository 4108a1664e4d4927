//! Configuration loading and parsing.
//!
//! Parses `framewatch.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [display]
//! verbosity = "verbose"     # simple | default | verbose
//! refresh_ms = 500          # repaint cadence
//! staging_capacity = 16384  # max cells written per repaint
//! ```
//!
//! Every field is optional. A missing file yields defaults; a file that fails
//! to parse also yields defaults (logged under the `config` target) so a typo
//! never keeps the monitor from starting. Unknown fields are ignored.
//!
//! Command line flags are layered on top via [`Config::apply_overrides`];
//! the display tier itself only ever sees the resolved [`VerbosityLevel`].

use anyhow::Result;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "framewatch.toml";
pub const DEFAULT_REFRESH_MS: u64 = 1000;
/// Lower bound keeps a misconfigured cadence from spinning the reporting thread.
pub const MIN_REFRESH_MS: u64 = 16;

/// Amount of detail in the per-chain report lines.
///
/// Ordering is significant: the composer gates clauses on `> Simple` and
/// `>= Verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    Simple,
    #[default]
    Default,
    Verbose,
}

impl VerbosityLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            VerbosityLevel::Simple => "simple",
            VerbosityLevel::Default => "default",
            VerbosityLevel::Verbose => "verbose",
        }
    }
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVerbosityError(String);

impl fmt::Display for ParseVerbosityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown verbosity {:?} (expected simple, default or verbose)",
            self.0
        )
    }
}

impl std::error::Error for ParseVerbosityError {}

impl FromStr for VerbosityLevel {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(VerbosityLevel::Simple),
            "default" => Ok(VerbosityLevel::Default),
            "verbose" => Ok(VerbosityLevel::Verbose),
            _ => Err(ParseVerbosityError(s.to_string())),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    #[serde(default)]
    pub verbosity: VerbosityLevel,
    #[serde(default = "DisplayConfig::default_refresh_ms")]
    pub refresh_ms: u64,
    /// `None` leaves the repainter's built-in capacity in place.
    #[serde(default)]
    pub staging_capacity: Option<usize>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            verbosity: VerbosityLevel::default(),
            refresh_ms: Self::default_refresh_ms(),
            staging_capacity: None,
        }
    }
}

impl DisplayConfig {
    const fn default_refresh_ms() -> u64 {
        DEFAULT_REFRESH_MS
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Values supplied on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub verbosity: Option<VerbosityLevel>,
    pub refresh_ms: Option<u64>,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("framewatch").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", file = %path.display(), "config_loaded");
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(e) => {
                warn!(target: "config", file = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        self.file.display.verbosity
    }

    /// Repaint cadence, never shorter than [`MIN_REFRESH_MS`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.file.display.refresh_ms.max(MIN_REFRESH_MS))
    }

    /// Configured staging capacity, raised to at least one cell.
    pub fn staging_capacity(&self) -> Option<usize> {
        self.file.display.staging_capacity.map(|raw| {
            if raw == 0 {
                info!(target: "config", raw, clamped = 1, "staging_capacity_clamped");
                1
            } else {
                raw
            }
        })
    }

    /// Layer command line values over the file values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.verbosity {
            self.file.display.verbosity = v;
        }
        if let Some(ms) = overrides.refresh_ms {
            self.file.display.refresh_ms = ms;
        }
    }
}
