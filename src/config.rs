//! Application-level configuration loading, including the storage backend selection.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RESTO_CONTEST_CONFIG_PATH";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_MUTATION_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SSE_CAPACITY: usize = 64;

/// Backend used to persist competitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// REST service of the web application.
    Http,
    /// In-process store, optionally seeded from a JSON file.
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(StoreBackend::Http),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Listen port of the HTTP server.
    pub port: u16,
    /// Base URL of the backing REST service.
    pub api_url: String,
    /// Token sent to the backing service, if any.
    pub api_token: Option<String>,
    /// Selected storage backend.
    pub store: StoreBackend,
    /// Seed file loaded by the in-memory backend.
    pub memory_seed: Option<PathBuf>,
    /// Upper bound for a single mutation round trip; `None` disables it.
    pub mutation_timeout: Option<Duration>,
    /// Buffer size of the SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the configuration from disk, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        store = ?app_config.store,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = %value, error = %err, "ignoring invalid PORT"),
            }
        }
        if let Some(url) = lookup("API_URL").filter(|url| !url.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup("API_TOKEN") {
            self.api_token = Some(token).filter(|token| !token.is_empty());
        }
        if let Some(value) = lookup("STORE_BACKEND") {
            match StoreBackend::parse(&value) {
                Some(store) => self.store = store,
                None => warn!(value = %value, "ignoring unknown STORE_BACKEND"),
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_url: DEFAULT_API_URL.into(),
            api_token: None,
            store: StoreBackend::Http,
            memory_seed: None,
            mutation_timeout: Some(Duration::from_millis(DEFAULT_MUTATION_TIMEOUT_MS)),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    store: Option<StoreBackend>,
    #[serde(default)]
    memory_seed: Option<PathBuf>,
    /// `0` disables the timeout.
    #[serde(default)]
    mutation_timeout_ms: Option<u64>,
    #[serde(default)]
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let mutation_timeout = match value.mutation_timeout_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.mutation_timeout,
        };

        Self {
            port: value.port.unwrap_or(defaults.port),
            api_url: value.api_url.unwrap_or(defaults.api_url),
            api_token: value.api_token.filter(|token| !token.is_empty()),
            store: value.store.unwrap_or(defaults.store),
            memory_seed: value.memory_seed,
            mutation_timeout,
            sse_capacity: value.sse_capacity.unwrap_or(defaults.sse_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_fill_gaps_with_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"store": "memory", "memory_seed": "config/seed.json", "mutation_timeout_ms": 0}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.memory_seed, Some(PathBuf::from("config/seed.json")));
        assert_eq!(config.mutation_timeout, None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9090"),
            ("API_URL", "https://resto.example"),
            ("API_TOKEN", "secret"),
            ("STORE_BACKEND", "Memory"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.port, 9090);
        assert_eq!(config.api_url, "https://resto.example");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "PORT" => Some("not-a-port".into()),
            "STORE_BACKEND" => Some("mongo".into()),
            _ => None,
        });

        assert_eq!(config, AppConfig::default());
    }
}
