use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    /// Directory the backup sink writes to.
    pub output_dir: PathBuf,
    pub file_pattern: String,
    pub batch_size: usize,
    /// Quality gate: offers scoring below this are dropped before loading.
    pub min_quality: f64,
    pub max_parallel_writers: usize,
    pub max_parallel_files: usize,
    pub max_technologies: usize,
    pub home_country: String,
    pub error_sample_size: usize,
    pub sink_timeout: Duration,
    pub sink_max_retries: u32,
    pub backup_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            file_pattern: "*.jsonl".to_string(),
            batch_size: 100,
            min_quality: 0.6,
            max_parallel_writers: 4,
            max_parallel_files: 4,
            max_technologies: 15,
            home_country: "France".to_string(),
            error_sample_size: 10,
            sink_timeout: Duration::from_secs(10),
            sink_max_retries: 2,
            backup_enabled: true,
        }
    }
}

impl PipelineConfig {
    /// Read configuration from `TJM_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            source_dir: lookup("TJM_SOURCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_dir),
            output_dir: lookup("TJM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            file_pattern: lookup("TJM_FILE_PATTERN").unwrap_or(defaults.file_pattern),
            batch_size: parse_var(&lookup, "TJM_BATCH_SIZE", defaults.batch_size)?,
            min_quality: parse_var(&lookup, "TJM_MIN_QUALITY", defaults.min_quality)?,
            max_parallel_writers: parse_var(
                &lookup,
                "TJM_MAX_PARALLEL_WRITERS",
                defaults.max_parallel_writers,
            )?,
            max_parallel_files: parse_var(
                &lookup,
                "TJM_MAX_PARALLEL_FILES",
                defaults.max_parallel_files,
            )?,
            max_technologies: parse_var(&lookup, "TJM_MAX_TECHNOLOGIES", defaults.max_technologies)?,
            home_country: lookup("TJM_HOME_COUNTRY").unwrap_or(defaults.home_country),
            error_sample_size: parse_var(
                &lookup,
                "TJM_ERROR_SAMPLE_SIZE",
                defaults.error_sample_size,
            )?,
            sink_timeout: Duration::from_secs(parse_var(
                &lookup,
                "TJM_SINK_TIMEOUT_SECS",
                defaults.sink_timeout.as_secs(),
            )?),
            sink_max_retries: parse_var(&lookup, "TJM_SINK_MAX_RETRIES", defaults.sink_max_retries)?,
            backup_enabled: parse_bool(&lookup, "TJM_BACKUP_ENABLED", defaults.backup_enabled)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), AppError> {
        let at_least_one = [
            ("TJM_BATCH_SIZE", self.batch_size),
            ("TJM_MAX_PARALLEL_WRITERS", self.max_parallel_writers),
            ("TJM_MAX_PARALLEL_FILES", self.max_parallel_files),
            ("TJM_MAX_TECHNOLOGIES", self.max_technologies),
        ];
        for (name, value) in at_least_one {
            if value == 0 {
                return Err(AppError::ConfigError(format!("{name} must be at least 1")));
            }
        }
        if !(0.0..=1.0).contains(&self.min_quality) {
            return Err(AppError::ConfigError(format!(
                "TJM_MIN_QUALITY must be within 0..=1, got {}",
                self.min_quality
            )));
        }
        if self.sink_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "TJM_SINK_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        if self.file_pattern.trim().is_empty() {
            return Err(AppError::ConfigError("TJM_FILE_PATTERN must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    pub fn with_min_quality(mut self, min_quality: f64) -> Self {
        self.min_quality = min_quality;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!("Invalid {key} '{raw}': expected a number"))
        }),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::ConfigError(format!(
                "Invalid {key} '{v}': expected true or false"
            ))),
        },
    }
}
