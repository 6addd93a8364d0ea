use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::OLDEST_YEAR_EXCLUSIVE;

/// Project defaults, also written out as the user's config on first run.
const BLUEPRINT: &str = include_str!("../config/moviescroll.default.toml");

static API_KEY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{20,64}$").unwrap());

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub image_base_url: String,
    pub poster_width: String,
    pub seed_year: i32,
    pub min_vote_count: u32,
    pub scroll_threshold: f64,
    pub request_timeout_secs: u64,
    pub log_file: String,
}

impl Settings {
    /// Merges, lowest precedence first: built-in defaults, the user config,
    /// `moviescroll.toml` in the working directory, an explicit `--config`
    /// file, and `MOVIESCROLL_*` environment variables.
    pub fn load_from(user_config_path: &Path, extra: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layers(user_config_path, extra, None)
    }

    /// Same as [`Settings::load_from`], reading `MOVIESCROLL_*` from `env`
    /// instead of the process environment when given.
    fn load_layers(
        user_config_path: &Path,
        extra: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::from_str(BLUEPRINT, FileFormat::Toml))
            .add_source(File::from(user_config_path.to_path_buf()).required(false))
            .add_source(File::with_name("moviescroll.toml").required(false));
        if let Some(extra) = extra {
            builder = builder.add_source(File::from(extra.to_path_buf()).required(true));
        }
        let s = builder
            .add_source(Environment::with_prefix("MOVIESCROLL").source(env))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.check_threshold()?;
        Ok(settings)
    }

    /// Command-line flags win over every config layer.
    pub fn with_overrides(mut self, api_key: Option<String>, seed_year: Option<i32>) -> Self {
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        if let Some(year) = seed_year {
            self.seed_year = year;
        }
        self
    }

    /// Final check once every layer and flag is applied. The seed year must
    /// be one the year window can request.
    pub fn validate(&self, current_year: i32) -> Result<(), ConfigError> {
        self.check_threshold()?;
        let oldest = OLDEST_YEAR_EXCLUSIVE + 1;
        if !(oldest..=current_year).contains(&self.seed_year) {
            return Err(ConfigError::Message(format!(
                "seed_year must be within {oldest}..={current_year} (got {})",
                self.seed_year
            )));
        }
        Ok(())
    }

    fn check_threshold(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.scroll_threshold) {
            return Err(ConfigError::Message(format!(
                "scroll_threshold must be within 0.0..=1.0 (got {})",
                self.scroll_threshold
            )));
        }
        Ok(())
    }

    /// Configured key, falling back to one baked in at build time.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| option_env!("TMDB_API_KEY").map(str::to_string))
    }

    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).into_owned())
    }
}

pub fn get_user_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".config");
    path.push("moviescroll");
    path.push("moviescroll.toml");
    Some(path)
}

/// Writes the blueprint to `path` unless a config already exists there.
pub fn ensure_user_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, BLUEPRINT)?;
    Ok(true)
}

pub fn save_api_key(path: &Path, api_key: &str) -> Result<(), anyhow::Error> {
    let config_str = fs::read_to_string(path).unwrap_or_else(|_| "".to_string());
    let mut doc = config_str.parse::<toml::Table>()?;

    doc.insert("api_key".to_string(), toml::Value::String(api_key.to_string()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_string())?;

    Ok(())
}

/// TMDB v3 keys are 32 alphanumerics; anything from 20 to 64 is accepted.
pub fn validate_api_key(key: &str) -> Result<(), String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err("TMDB API key is empty".to_string());
    }
    if !API_KEY_REGEX.is_match(trimmed) {
        return Err(format!(
            "TMDB API key should be 20-64 letters and digits (got {} characters)",
            trimmed.chars().count()
        ));
    }
    Ok(())
}
