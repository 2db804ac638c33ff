use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "WAYPOINT_GATEWAY_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "WAYPOINT_GATEWAY_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "WAYPOINT_GATEWAY_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "WAYPOINT_GATEWAY_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "WAYPOINT_GATEWAY_REDIS_URL";
pub const CACHE_PREFIX_ENV: &str = "WAYPOINT_GATEWAY_CACHE_PREFIX";
pub const LOG_FORMAT_ENV: &str = "WAYPOINT_GATEWAY_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_CACHE_PREFIX: &str = waypoint_cache::redis::DEFAULT_KEY_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    /// Starts empty and nothing writes to it; every request passes through
    #[value(name = "in-memory")]
    InMemory,
    /// Serves the rules stored in MySQL
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "waypoint-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Where redirect rules are read from.
    ///
    /// The gateway has no write API, so `in-memory` holds no rules and only
    /// passes requests through. Use `mysql` to serve rules managed elsewhere.
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Memory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Key prefix for indexes published to Redis.
    #[arg(long, env = CACHE_PREFIX_ENV, default_value = DEFAULT_CACHE_PREFIX)]
    pub cache_prefix: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
