//! Environment-driven configuration
//!
//! Values are read once at startup. Call `dotenv::dotenv()` before
//! `AssistantConfig::from_env()` to pick up a local `.env` file.

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub mealdb_base_url: String,
    pub http_timeout: Duration,
    pub data_dir: PathBuf,
    pub port: u16,
    /// `None` keeps re-prompting forever on invalid selections.
    pub max_selection_retries: Option<u32>,
    pub session_idle_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: String::new(),
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
            mealdb_base_url: DEFAULT_MEALDB_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(30),
            data_dir: PathBuf::from("data"),
            port: 8080,
            max_selection_retries: None,
            session_idle_timeout: Duration::from_secs(1800),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => parse_value("PORT", &raw)?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            openrouter_base_url: env::var("OPENROUTER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openrouter_base_url),
            openrouter_model: env::var("OPENROUTER_MODEL").unwrap_or(defaults.openrouter_model),
            mealdb_base_url: env::var("MEALDB_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.mealdb_base_url),
            http_timeout: optional_var::<u64>("HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            port,
            max_selection_retries: optional_var::<u32>("MAX_SELECTION_RETRIES")?,
            session_idle_timeout: optional_var::<u64>("SESSION_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_timeout),
        })
    }
}

fn optional_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(name, &raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AssistantError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}
