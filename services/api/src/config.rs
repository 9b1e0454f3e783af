//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `GenerationService` implementation the server wires in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    /// Fixed delay, templated content.
    Mock,
    /// OpenAI chat completions.
    OpenAi,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage_dir: PathBuf,
    pub generator: GeneratorKind,
    pub generation_delay: Duration,
    pub openai_api_key: Option<String>,
    pub generation_model: String,
    pub synonyms_path: Option<PathBuf>,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Storage ---
        let storage_dir = var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        let synonyms_path = var("SYNONYMS_PATH").map(PathBuf::from);

        // --- Generation ---
        let generator = match var("GENERATOR").as_deref().unwrap_or("mock") {
            "mock" => GeneratorKind::Mock,
            "openai" => GeneratorKind::OpenAi,
            other => {
                return Err(ConfigError::InvalidValue(
                    "GENERATOR".to_string(),
                    format!("'{}' is not one of mock, openai", other),
                ))
            }
        };

        let delay_ms = match var("GENERATION_DELAY_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("GENERATION_DELAY_MS".to_string(), e.to_string())
            })?,
            None => 2000,
        };

        let openai_api_key = var("OPENAI_API_KEY");
        if generator == GeneratorKind::OpenAi && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()));
        }
        let generation_model =
            var("GENERATION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        Ok(Self {
            bind_address,
            log_level,
            storage_dir,
            generator,
            generation_delay: Duration::from_millis(delay_ms),
            openai_api_key,
            generation_model,
            synonyms_path,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.generator, GeneratorKind::Mock);
        assert_eq!(config.generation_delay, Duration::from_millis(2000));
        assert_eq!(config.storage_dir, PathBuf::from("./data"));
        assert!(config.synonyms_path.is_none());
    }

    #[test]
    fn openai_generator_requires_a_key() {
        let err = Config::from_lookup(lookup(&[("GENERATOR", "openai")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "OPENAI_API_KEY"));

        let config =
            Config::from_lookup(lookup(&[("GENERATOR", "openai"), ("OPENAI_API_KEY", "sk")]))
                .unwrap();
        assert_eq!(config.generator, GeneratorKind::OpenAi);
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = Config::from_lookup(lookup(&[("GENERATION_DELAY_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "GENERATION_DELAY_MS"));

        let err = Config::from_lookup(lookup(&[("BIND_ADDRESS", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "BIND_ADDRESS"));
    }
}
