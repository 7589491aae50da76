// Application configuration, loaded once at start-up and read-only afterwards

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;

pub const ENV_PREFIX: &str = "TRAVEL_PLANNER";

// Plain environment variables holding the provider credentials
pub const SERPAPI_KEY_VAR: &str = "SERPAPI_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub serpapi: SerpApiConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

// Flight search provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub engine: String,
    pub currency: String,
    pub locale: String,
    pub timeout_secs: u64,
}

// Language model settings for itinerary generation
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// With an explicit `path` only that file is read; otherwise the optional
    /// `config/default` and `config/local` files are merged. Environment
    /// variables prefixed with `TRAVEL_PLANNER__` come next, and the plain
    /// `SERPAPI_KEY` / `GEMINI_API_KEY` variables win over everything.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Self::defaults()?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        };

        let builder = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("serpapi.api_key", env::var(SERPAPI_KEY_VAR).ok())?
            .set_override_option("gemini.api_key", env::var(GEMINI_KEY_VAR).ok())?;

        Self::from_builder(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("server.bind", "127.0.0.1:8501")?
            .set_default("serpapi.api_key", "")?
            .set_default("serpapi.base_url", "https://serpapi.com")?
            .set_default("serpapi.engine", "google_flights")?
            .set_default("serpapi.currency", "INR")?
            .set_default("serpapi.locale", "en")?
            .set_default("serpapi.timeout_secs", 60_i64)?
            .set_default("gemini.api_key", "")?
            .set_default(
                "gemini.base_url",
                "https://generativelanguage.googleapis.com",
            )?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default("gemini.timeout_secs", 300_i64)?)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.serpapi.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(SERPAPI_KEY_VAR));
        }
        if self.gemini.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(GEMINI_KEY_VAR));
        }
        Ok(())
    }
}
