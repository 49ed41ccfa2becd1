use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{HotelError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Cleaning, occupancy and revenue analysis for hotel booking exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hotel-analysis",
    about = "Cleaning, occupancy and revenue analysis for hotel booking exports",
    version
)]
pub struct Settings {
    /// Directory holding the CSV exports (searched recursively)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Extra month of enriched occupancy rows to append
    #[arg(long)]
    pub supplementary: Option<PathBuf>,

    /// Month label used for the per-city occupancy breakdown
    #[arg(long, default_value = "Jun 22")]
    pub month: String,

    /// Standard deviations above the mean at which revenue is an outlier
    #[arg(long, default_value = "3.0")]
    pub sigma: f64,

    /// What to do with aggregated rows whose capacity is zero
    #[arg(long, default_value = "drop", value_parser = ["drop", "error"])]
    pub zero_capacity: String,

    /// Report format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── ZeroCapacityPolicy ─────────────────────────────────────────────────────────

/// Handling of aggregated rows whose capacity is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroCapacityPolicy {
    /// Reject the row during cleaning.
    #[default]
    Drop,
    /// Keep the row; the occupancy transform then fails with a division error.
    Error,
}

impl FromStr for ZeroCapacityPolicy {
    type Err = HotelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "drop" => Ok(ZeroCapacityPolicy::Drop),
            "error" => Ok(ZeroCapacityPolicy::Error),
            other => Err(HotelError::Config(format!("Invalid zero-capacity policy: {other}"))),
        }
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.hotel-analysis/last_used.json`.
///
/// Only presentation choices are remembered. Inputs and cleaning parameters
/// always come from the current command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".hotel-analysis").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over the persisted value.
        if !is_arg_explicitly_set(&matches, "month") {
            if let Some(v) = last.month {
                settings.month = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Reject values clap cannot range-check itself.
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(HotelError::Config(format!(
                "sigma must be a positive number, got {}",
                self.sigma
            )));
        }
        if self.month.trim().is_empty() {
            return Err(HotelError::Config("month label must not be empty".into()));
        }
        Ok(())
    }

    /// The parsed `--zero-capacity` value.
    pub fn zero_capacity_policy(&self) -> Result<ZeroCapacityPolicy> {
        self.zero_capacity.parse()
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            month: Some(s.month.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
