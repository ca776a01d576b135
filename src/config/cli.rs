use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the inkblog binary.
#[derive(Debug, Parser)]
#[command(name = "inkblog", version, about = "inkblog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "INKBLOG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server (API, SSR pages and static bundle).
    Serve(Box<ServeArgs>),
    /// Hydrate a served page from its embedded data and from a cold fetch, and compare the markup.
    #[command(name = "verify-hydration")]
    VerifyHydration(VerifyHydrationArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

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

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the Redis URL used for the shared list cache.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,

    /// Override the list cache TTL.
    #[arg(long = "cache-list-ttl-seconds", value_name = "SECONDS")]
    pub cache_list_ttl_seconds: Option<u64>,

    /// Override the per-article cache TTL.
    #[arg(long = "cache-article-ttl-seconds", value_name = "SECONDS")]
    pub cache_article_ttl_seconds: Option<u64>,

    /// Override the directory holding the built client bundle.
    #[arg(long = "ssr-static-dir", value_name = "PATH")]
    pub ssr_static_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct VerifyHydrationArgs {
    /// Base URL of a running inkblog server.
    #[arg(long = "site", env = "INKBLOG_SITE_URL", value_name = "URL")]
    pub site: String,

    /// Page path to verify, e.g. `/article/7`.
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,
}
