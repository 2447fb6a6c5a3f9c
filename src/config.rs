use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub firestore: FirestoreSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

fn default_backend() -> StoreBackend { StoreBackend::Firestore }
fn default_query_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreSettings {
    #[serde(default = "default_firestore_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    #[serde(default = "default_requests_collection")]
    pub requests_collection: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_firestore_endpoint(),
            project_id: String::new(),
            database_id: default_database_id(),
            api_key: None,
            bearer_token: None,
            users_collection: default_users_collection(),
            requests_collection: default_requests_collection(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_firestore_endpoint() -> String { "https://firestore.googleapis.com/v1".to_string() }
fn default_database_id() -> String { "(default)".to_string() }
fn default_users_collection() -> String { "users".to_string() }
fn default_requests_collection() -> String { "requests".to_string() }
fn default_request_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

fn default_true() -> bool { true }
fn default_cache_ttl() -> u64 { 30 }
fn default_cache_entries() -> u64 { 64 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_window_days")]
    pub eligibility_window_days: i64,
    pub max_results: Option<usize>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            eligibility_window_days: default_window_days(),
            max_results: None,
        }
    }
}

fn default_window_days() -> i64 { crate::core::ELIGIBILITY_WINDOW_DAYS }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LIFEDROPS)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LIFEDROPS__SERVER__PORT -> server.port
            .add_source(environment())
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Reject values that deserialize fine but would make every search empty
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.matching.eligibility_window_days <= 0 {
            return Err(ConfigError::Message(format!(
                "matching.eligibility_window_days must be positive, got {}",
                self.matching.eligibility_window_days
            )));
        }
        if self.matching.max_results == Some(0) {
            return Err(ConfigError::Message(
                "matching.max_results must be at least 1 when set".to_string(),
            ));
        }
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("LIFEDROPS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
