use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub firestore: Option<FirestoreSettings>,
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

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
    /// In-process entries are not invalidated across instances
    pub l1_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreSettings {
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    pub project_id: String,
    #[serde(default = "default_firestore_database")]
    pub database_id: String,
    #[serde(default = "default_firestore_collection")]
    pub collection: String,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn default_firestore_base_url() -> String { "https://firestore.googleapis.com/v1".to_string() }
fn default_firestore_database() -> String { "(default)".to_string() }
fn default_firestore_collection() -> String { "itinerary".to_string() }

/// Which store supplies candidate itineraries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Postgres,
    Firestore,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    #[serde(default)]
    pub candidate_source: SourceKind,
    /// Upper bound on candidates pulled from the source per search
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            candidate_source: SourceKind::default(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_fetch_limit() -> usize { 500 }

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
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TRAVALPASS__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TRAVALPASS__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("TRAVALPASS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Well-known variables set by hosting platforms take precedence
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// The access token only completes an existing `[firestore]` section; on
/// its own it would create a section without `project_id`.
fn apply_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let has_firestore = settings.get_table("firestore").is_ok();
    let mut builder = Config::builder().add_source(settings);

    if let Some(database_url) = lookup("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Some(redis_url) = lookup("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }
    if let Some(token) = lookup("FIRESTORE_ACCESS_TOKEN") {
        if has_firestore {
            builder = builder.set_override("firestore.access_token", token)?;
        } else {
            tracing::debug!("FIRESTORE_ACCESS_TOKEN set without a [firestore] section, ignoring");
        }
    }

    builder.build()
}
