use crate::types::{CrecError, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// All content-related settings. Built once at startup and passed by
/// reference into the index, the ingester and the aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import_queue_dir: PathBuf,
    pub full_text_index: bool,
    pub full_text_index_dir: PathBuf,
    pub full_text_index_file: String,
    pub index_refresh_interval_minutes: u64,
    /// Accept-language strings whose localized content is computed ahead of
    /// publication, comma separated.
    pub locales: String,
    /// Recommender names in merge order.
    pub recommenders: Vec<String>,
    pub client_cache_max_age_seconds: u64,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_content_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "crec/0.1".to_string(),
            timeout_seconds: 5,
            max_retries: 1,
            retry_delay_seconds: 1,
            max_content_size_mb: 10,
            max_redirects: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import_queue_dir: PathBuf::from("import"),
            full_text_index: true,
            full_text_index_dir: PathBuf::from("index"),
            full_text_index_file: "crec.idx".to_string(),
            index_refresh_interval_minutes: 5,
            locales: "en, en-US".to_string(),
            recommenders: vec![
                "tags".to_string(),
                "query".to_string(),
                "provider".to_string(),
            ],
            client_cache_max_age_seconds: 120,
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `CREC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = env_var("CREC_IMPORT_QUEUE_DIR") {
            config.import_queue_dir = PathBuf::from(dir);
        }
        if let Some(flag) = env_var("CREC_FULL_TEXT_INDEX") {
            config.full_text_index = parse_env("CREC_FULL_TEXT_INDEX", &flag)?;
        }
        if let Some(dir) = env_var("CREC_FULL_TEXT_INDEX_DIR") {
            config.full_text_index_dir = PathBuf::from(dir);
        }
        if let Some(file) = env_var("CREC_FULL_TEXT_INDEX_FILE") {
            config.full_text_index_file = file;
        }
        if let Some(minutes) = env_var("CREC_INDEX_REFRESH_INTERVAL_MINUTES") {
            config.index_refresh_interval_minutes =
                parse_env("CREC_INDEX_REFRESH_INTERVAL_MINUTES", &minutes)?;
        }
        if let Some(locales) = env_var("CREC_LOCALES") {
            config.locales = locales;
        }
        if let Some(names) = env_var("CREC_RECOMMENDERS") {
            config.recommenders = names
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if let Some(seconds) = env_var("CREC_CLIENT_CACHE_MAX_AGE_SECONDS") {
            config.client_cache_max_age_seconds =
                parse_env("CREC_CLIENT_CACHE_MAX_AGE_SECONDS", &seconds)?;
        }
        if let Some(seconds) = env_var("CREC_FETCH_TIMEOUT_SECONDS") {
            config.fetch.timeout_seconds = parse_env("CREC_FETCH_TIMEOUT_SECONDS", &seconds)?;
        }
        if let Some(retries) = env_var("CREC_FETCH_MAX_RETRIES") {
            config.fetch.max_retries = parse_env("CREC_FETCH_MAX_RETRIES", &retries)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Config rooted at the given queue and index directories, everything
    /// else defaulted.
    pub fn with_dirs(import_queue_dir: &Path, full_text_index_dir: &Path) -> Self {
        Self {
            import_queue_dir: import_queue_dir.to_path_buf(),
            full_text_index_dir: full_text_index_dir.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_refresh_interval_minutes == 0 {
            return Err(CrecError::Config(
                "index_refresh_interval_minutes must be greater than zero".to_string(),
            ));
        }
        if self.fetch.timeout_seconds == 0 {
            return Err(CrecError::Config(
                "fetch.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.full_text_index && self.full_text_index_file.trim().is_empty() {
            return Err(CrecError::Config(
                "full_text_index_file must be set when full-text indexing is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.index_refresh_interval_minutes * 60)
    }

    pub fn full_text_index_path(&self, generation_id: &str) -> PathBuf {
        self.full_text_index_dir
            .join(generation_id)
            .join(&self.full_text_index_file)
    }

    pub fn provider_queue_dir(&self, provider_id: &str) -> PathBuf {
        self.import_queue_dir.join(provider_id)
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| CrecError::Config(format!("Invalid value for {}: {}", key, value)))
}
