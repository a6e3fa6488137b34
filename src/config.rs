use serde::{Deserialize, Serialize};
use std::{
    env::VarError,
    fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::error::Error;

pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const APP_DIR: &str = "pagewatch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub log: LogOptions,
}

/// What to watch and how often. The monitor clones this at start, so edits
/// made while it runs only apply to the next session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub url: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl MonitorConfig {
    pub fn new(url: impl Into<String>, interval_secs: u64) -> Self {
        Self {
            url: url.into(),
            interval_secs,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Checks that the URL is an absolute http(s) URL and that both durations
    /// are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlParse`] for an unparsable URL and [`Error::Config`]
    /// for any other invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported URL scheme '{}', expected http or https",
                url.scheme()
            )));
        }
        if self.interval_secs == 0 {
            return Err(Error::Config("interval_secs must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

impl Config {
    /// Location of the config file under the user's config directory.
    ///
    /// # Errors
    ///
    /// Fails when the platform has no config directory.
    pub fn default_path() -> Result<PathBuf, Error> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| Error::Config("could not determine config directory".into()))
    }

    /// Reads and parses a TOML config file, applies the `PAGEWATCH_URL` and
    /// `PAGEWATCH_INTERVAL_SECS` environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the resulting monitor settings are invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_overrides(env_override)?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Parses and validates TOML config text, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config.
    pub fn parse(content: &str) -> Result<Config, Error> {
        let config: Config = toml::from_str(content)?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Builds a config purely from `PAGEWATCH_URL` and the optional
    /// `PAGEWATCH_INTERVAL_SECS`, for first runs without a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if `PAGEWATCH_URL` is unset or a value is invalid.
    pub fn from_env() -> Result<Config, Error> {
        let url = dotenvy::var("PAGEWATCH_URL")?;
        let mut config = Config {
            monitor: MonitorConfig::new(url, DEFAULT_INTERVAL_SECS),
            log: LogOptions::default(),
        };
        config.apply_overrides(env_override)?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Serializes the config as TOML, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    /// Applies `PAGEWATCH_URL` and `PAGEWATCH_INTERVAL_SECS` as looked up by
    /// `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Result<Option<String>, Error>,
    {
        if let Some(url) = lookup("PAGEWATCH_URL")? {
            self.monitor.url = url;
        }

        if let Some(interval) = lookup("PAGEWATCH_INTERVAL_SECS")? {
            self.monitor.interval_secs = interval.parse().map_err(|_| {
                Error::Config(format!("invalid PAGEWATCH_INTERVAL_SECS '{interval}'"))
            })?;
        }
        Ok(())
    }
}

fn env_override(key: &str) -> Result<Option<String>, Error> {
    match dotenvy::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
