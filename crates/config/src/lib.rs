use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "skillswap.toml",
    "config/skillswap.toml",
    "crates/config/skillswap.toml",
    "../skillswap.toml",
    "../config/skillswap.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Allowed browser origin for credentialed requests. `None` allows any origin
    /// without credentials.
    #[serde(default)]
    pub cors_origin: Option<String>,
    /// Shared secret for service callbacks under `/internal`. Unset disables them.
    #[serde(default)]
    pub internal_token: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
            cors_origin: None,
            internal_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://skillswap.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for verifying the access-token cookie presented by clients.
///
/// ```
/// use skillswap_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.cookie_name, "accessToken");
/// assert_eq!(auth.access_token_ttl_seconds, 86_400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_secret")]
    pub access_token_secret: String,
    #[serde(default = "AuthConfig::default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "AuthConfig::default_ttl")]
    pub access_token_ttl_seconds: u64,
}

impl AuthConfig {
    fn default_secret() -> String {
        "default_secret_change_in_production".to_string()
    }

    fn default_cookie_name() -> String {
        "accessToken".to_string()
    }

    const fn default_ttl() -> u64 {
        86_400
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: Self::default_secret(),
            cookie_name: Self::default_cookie_name(),
            access_token_ttl_seconds: Self::default_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Check exchange participation before admitting a connection to an exchange room.
    #[serde(default = "RealtimeConfig::default_authorize_joins")]
    pub authorize_joins: bool,
    /// Per-connection outbound queue length; frames beyond it are dropped.
    #[serde(default = "RealtimeConfig::default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl RealtimeConfig {
    const fn default_authorize_joins() -> bool {
        true
    }

    const fn default_outbound_buffer() -> usize {
        64
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            authorize_joins: Self::default_authorize_joins(),
            outbound_buffer: Self::default_outbound_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "JobsConfig::default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "JobsConfig::default_min_exchanges")]
    pub min_exchanges_for_verification: usize,
    #[serde(default = "JobsConfig::default_min_rating")]
    pub min_rating_for_verification: f64,
    #[serde(default = "JobsConfig::default_min_reviews")]
    pub min_reviews_for_summary: usize,
}

impl JobsConfig {
    const fn default_queue_capacity() -> usize {
        256
    }

    const fn default_min_exchanges() -> usize {
        3
    }

    const fn default_min_rating() -> f64 {
        4.5
    }

    const fn default_min_reviews() -> usize {
        3
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::default_queue_capacity(),
            min_exchanges_for_verification: Self::default_min_exchanges(),
            min_rating_for_verification: Self::default_min_rating(),
            min_reviews_for_summary: Self::default_min_reviews(),
        }
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use skillswap_config::load;
///
/// std::env::remove_var("SKILLSWAP_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "auth.access_token_secret",
            defaults.auth.access_token_secret.clone(),
        )?
        .set_default("auth.cookie_name", defaults.auth.cookie_name.clone())?
        .set_default(
            "auth.access_token_ttl_seconds",
            clamp_to_i64(defaults.auth.access_token_ttl_seconds),
        )?
        .set_default("realtime.authorize_joins", defaults.realtime.authorize_joins)?
        .set_default(
            "realtime.outbound_buffer",
            clamp_to_i64(defaults.realtime.outbound_buffer as u64),
        )?
        .set_default(
            "jobs.queue_capacity",
            clamp_to_i64(defaults.jobs.queue_capacity as u64),
        )?;

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("SKILLSWAP_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via SKILLSWAP_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("SKILLSWAP").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.access_token_ttl_seconds > i64::MAX as u64 {
        config.auth.access_token_ttl_seconds = i64::MAX as u64;
    }

    if config.realtime.outbound_buffer == 0 {
        config.realtime.outbound_buffer = RealtimeConfig::default_outbound_buffer();
    }

    if config.jobs.queue_capacity == 0 {
        config.jobs.queue_capacity = JobsConfig::default_queue_capacity();
    }

    debug!(
        http = ?config.http,
        database = %config.database.url,
        realtime = ?config.realtime,
        jobs = ?config.jobs,
        "loaded backend configuration"
    );
    Ok(config)
}
