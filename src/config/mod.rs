//! Configuration module for jsonloc.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::culture::CultureTag;
use crate::error::ConfigError;

/// Settings for the translation cache refresher.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Directory holding the translation files.
    pub directory: PathBuf,

    /// Glob matched against file names.
    pub pattern: String,

    /// A reload is skipped when the previous one of the same file is younger than this.
    pub quiet_interval: Duration,

    /// Wait after a change event before reading, so the writer can finish flushing.
    pub settle_delay: Duration,

    /// Number of reload workers.
    pub workers: usize,

    /// Capacity of the pending event queue.
    pub queue_capacity: usize,
}

impl RefreshSettings {
    /// Production timings for the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pattern: "*.json".to_string(),
            quiet_interval: Duration::from_secs(2),
            settle_delay: Duration::from_secs(1),
            workers: 2,
            queue_capacity: 256,
        }
    }

    /// Override the debounce timings.
    #[must_use]
    pub fn timings(mut self, quiet_interval: Duration, settle_delay: Duration) -> Self {
        self.quiet_interval = quiet_interval;
        self.settle_delay = settle_delay;
        self
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub refresh: RefreshSettings,

    /// Culture consulted when nothing is found for the requested one.
    pub fallback_culture: Option<CultureTag>,

    /// Culture the demo binary resolves with.
    pub default_culture: CultureTag,

    /// Entry limit of the in-memory store, `None` for unbounded.
    pub store_capacity: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `RESOURCE_PATH` wins over `RESOURCE_FOLDER`; the folder is relative to the
    /// working directory and defaults to `Resources`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let directory = match vars.get("RESOURCE_PATH") {
            Some(path) => PathBuf::from(path),
            None => {
                let folder = vars.get("RESOURCE_FOLDER").unwrap_or_else(|| "Resources".to_string());
                env::current_dir().unwrap_or_default().join(folder)
            }
        };

        let mut refresh = RefreshSettings::new(directory);
        if let Some(pattern) = vars.get("RESOURCE_PATTERN") {
            refresh.pattern = pattern;
        }
        refresh.quiet_interval = Duration::from_millis(vars.number("REFRESH_QUIET_INTERVAL_MS")?.unwrap_or(2000));
        refresh.settle_delay = Duration::from_millis(vars.number("REFRESH_SETTLE_DELAY_MS")?.unwrap_or(1000));
        refresh.workers = non_zero("REFRESH_WORKERS", vars.number("REFRESH_WORKERS")?.unwrap_or(2))? as usize;
        refresh.queue_capacity =
            non_zero("REFRESH_QUEUE_CAPACITY", vars.number("REFRESH_QUEUE_CAPACITY")?.unwrap_or(256))? as usize;

        let fallback_culture = vars
            .get("FALLBACK_CULTURE")
            .map(|value| parse_culture("FALLBACK_CULTURE", &value))
            .transpose()?;
        let default_culture =
            parse_culture("DEFAULT_CULTURE", &vars.get("DEFAULT_CULTURE").unwrap_or_else(|| "en".to_string()))?;
        let store_capacity = vars
            .number("STORE_MAX_CAPACITY")?
            .map(|capacity| non_zero("STORE_MAX_CAPACITY", capacity))
            .transpose()?;

        Ok(Self {
            refresh,
            fallback_culture,
            default_culture,
            store_capacity,
        })
    }
}

/// Variable source; blank values count as unset.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Parse an optional numeric variable.
    fn number(&self, name: &'static str) -> Result<Option<u64>, ConfigError> {
        self.get(name)
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber { name, value })
            })
            .transpose()
    }
}

fn non_zero(name: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { name });
    }
    Ok(value)
}

fn parse_culture(name: &'static str, value: &str) -> Result<CultureTag, ConfigError> {
    CultureTag::parse(value).map_err(|source| ConfigError::InvalidCulture { name, source })
}
