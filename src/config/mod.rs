//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::level_filters::LevelFilter;


const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "marquee";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_CAPACITY: usize = 512;
const DEFAULT_CACHE_TTL_MS: u64 = 30_000;
const DEFAULT_SESSION_TTL_HOURS: u64 = 72;
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Command-line arguments for the Marquee binary.
#[derive(Debug, Parser, Default)]
#[command(name = "marquee", version, about = "Marquee movie catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MARQUEE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Toggle the response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            graceful_shutdown_seconds: DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let host: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server host `{}`", self.host)))?;
        Ok(SocketAddr::new(host, self.port))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    #[serde(deserialize_with = "de_max_connections")]
    pub max_connections: MaxConnections,
}

#[derive(Debug, Clone, Copy)]
pub struct MaxConnections(pub u32);

impl Default for MaxConnections {
    fn default() -> Self {
        Self(DEFAULT_DB_MAX_CONNECTIONS)
    }
}

fn de_max_connections<'de, D>(deserializer: D) -> Result<MaxConnections, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u32::deserialize(deserializer)?;
    Ok(MaxConnections(value.max(1)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    #[serde(deserialize_with = "de_level_filter")]
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

fn de_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid log level `{raw}`")))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Maximum number of entries held by the in-process store.
    pub capacity: usize,
    pub default_ttl_ms: u64,
    /// Route-template → TTL overrides.
    pub ttl_ms: HashMap<String, u64>,
    /// Route templates eligible for response caching.
    pub routes: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CACHE_CAPACITY,
            default_ttl_ms: DEFAULT_CACHE_TTL_MS,
            ttl_ms: HashMap::new(),
            routes: vec!["/movies".to_string(), "/genres".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Static application keys accepted in the `x-api-key` header.
    pub api_keys: Vec<String>,
    pub session_ttl_hours: u64,
    pub default_page_size: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub auth: AuthSettings,
}

/// Load settings and CLI arguments, applying CLI overrides last.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

pub fn load(cli: &CliArgs) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = &cli.config_file {
        builder = builder.add_source(File::from(path.clone()));
    }

    let config = builder
        .add_source(Environment::with_prefix("MARQUEE").separator("__"))
        .build()?;

    let mut settings: Settings = config.try_deserialize()?;
    apply_cli_overrides(&mut settings, cli);
    Ok(settings)
}

fn apply_cli_overrides(settings: &mut Settings, cli: &CliArgs) {
    if let Some(host) = &cli.server_host {
        settings.server.host = host.clone();
    }
    if let Some(port) = cli.server_port {
        settings.server.port = port;
    }
    if let Some(level) = &cli.log_level
        && let Ok(parsed) = level.parse()
    {
        settings.logging.level = parsed;
    }
    if let Some(json) = cli.log_json {
        settings.logging.format = if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };
    }
    if let Some(url) = &cli.database_url {
        settings.database.url = Some(url.clone());
    }
    if let Some(enabled) = cli.cache_enabled {
        settings.cache.enabled = enabled;
    }
}
