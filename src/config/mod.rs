//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides, VerifyHydrationArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkblog";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_LIST_TTL_SECS: u64 = 300;
const DEFAULT_ARTICLE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_ARTICLE_CAPACITY: usize = 500;
const DEFAULT_STATIC_DIR: &str = "build";
const DEFAULT_TEMPLATE_FILE: &str = "index.html";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AI_TOKEN_LIFETIME_SECS: u64 = 29 * 24 * 60 * 60;
const MAX_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub ssr: SsrSettings,
    pub ai: AiSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub list_ttl: Duration,
    pub article_ttl: Duration,
    pub article_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct SsrSettings {
    pub static_dir: PathBuf,
    pub template_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    /// Present only when an endpoint and both credentials are configured.
    pub provider: Option<AiProviderSettings>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AiProviderSettings {
    pub endpoint: url::Url,
    pub token_url: url::Url,
    pub api_key: String,
    pub secret_key: String,
    pub token_lifetime: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("INKBLOG").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::VerifyHydration(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    ssr: RawSsrSettings,
    ai: RawAiSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(ttl) = overrides.cache_list_ttl_seconds {
            self.cache.list_ttl_seconds = Some(ttl);
        }
        if let Some(ttl) = overrides.cache_article_ttl_seconds {
            self.cache.article_ttl_seconds = Some(ttl);
        }
        if let Some(dir) = overrides.ssr_static_dir.as_ref() {
            self.ssr.static_dir = Some(dir.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            ssr,
            ai,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            ssr: build_ssr_settings(ssr)?,
            ai: build_ai_settings(ai)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let redis_url = non_blank(cache.redis_url);
    if let Some(url) = redis_url.as_deref() {
        let parsed = url::Url::parse(url)
            .map_err(|err| LoadError::invalid("cache.redis_url", err.to_string()))?;
        if !matches!(parsed.scheme(), "redis" | "rediss") {
            return Err(LoadError::invalid(
                "cache.redis_url",
                format!("unsupported scheme `{}`", parsed.scheme()),
            ));
        }
    }

    let capacity = cache.article_capacity.unwrap_or(DEFAULT_ARTICLE_CAPACITY);
    let article_capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
        LoadError::invalid("cache.article_capacity", "must be greater than zero")
    })?;

    Ok(CacheSettings {
        redis_url,
        list_ttl: bounded_lifetime(
            "cache.list_ttl_seconds",
            cache.list_ttl_seconds.unwrap_or(DEFAULT_LIST_TTL_SECS),
        )?,
        article_ttl: bounded_lifetime(
            "cache.article_ttl_seconds",
            cache
                .article_ttl_seconds
                .unwrap_or(DEFAULT_ARTICLE_TTL_SECS),
        )?,
        article_capacity,
    })
}

fn bounded_lifetime(key: &'static str, seconds: u64) -> Result<Duration, LoadError> {
    if seconds > MAX_LIFETIME_SECS {
        return Err(LoadError::invalid(
            key,
            format!("must be at most {MAX_LIFETIME_SECS} seconds"),
        ));
    }
    Ok(Duration::from_secs(seconds))
}

fn build_ssr_settings(ssr: RawSsrSettings) -> Result<SsrSettings, LoadError> {
    let static_dir = ssr
        .static_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
    if static_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid("ssr.static_dir", "path must not be empty"));
    }

    let template_file = ssr
        .template_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_FILE));
    if template_file.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "ssr.template_file",
            "path must not be empty",
        ));
    }

    let template_path = if template_file.is_absolute() {
        template_file
    } else {
        static_dir.join(template_file)
    };

    Ok(SsrSettings {
        static_dir,
        template_path,
    })
}

fn build_ai_settings(ai: RawAiSettings) -> Result<AiSettings, LoadError> {
    let timeout_secs = ai.timeout_seconds.unwrap_or(DEFAULT_AI_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "ai.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let endpoint = non_blank(ai.endpoint);
    let token_url = non_blank(ai.token_url);
    let api_key = non_blank(ai.api_key);
    let secret_key = non_blank(ai.secret_key);

    let provider = match (endpoint, token_url, api_key, secret_key) {
        (Some(endpoint), Some(token_url), Some(api_key), Some(secret_key)) => {
            Some(AiProviderSettings {
                endpoint: url::Url::parse(&endpoint)
                    .map_err(|err| LoadError::invalid("ai.endpoint", err.to_string()))?,
                token_url: url::Url::parse(&token_url)
                    .map_err(|err| LoadError::invalid("ai.token_url", err.to_string()))?,
                api_key,
                secret_key,
                token_lifetime: bounded_lifetime(
                    "ai.token_lifetime_seconds",
                    ai.token_lifetime_seconds
                        .unwrap_or(DEFAULT_AI_TOKEN_LIFETIME_SECS),
                )?,
            })
        }
        (None, None, None, None) => None,
        _ => {
            return Err(LoadError::invalid(
                "ai",
                "endpoint, token_url, api_key and secret_key must be configured together",
            ));
        }
    };

    Ok(AiSettings {
        provider,
        timeout: Duration::from_secs(timeout_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    redis_url: Option<String>,
    list_ttl_seconds: Option<u64>,
    article_ttl_seconds: Option<u64>,
    article_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSsrSettings {
    static_dir: Option<PathBuf>,
    template_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAiSettings {
    endpoint: Option<String>,
    token_url: Option<String>,
    api_key: Option<String>,
    secret_key: Option<String>,
    timeout_seconds: Option<u64>,
    token_lifetime_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
