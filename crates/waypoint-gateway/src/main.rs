mod app;
mod cli;
mod error;
mod handlers;
mod model;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::app::App;
use crate::cli::{CacheBackendArg, LogFormatArg, StorageBackendArg, CLI};
use crate::state::AppState;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use waypoint_cache::{MokaIndexCache, RedisIndexCache};
use waypoint_core::{DomainRedirect, IndexCache, ReadRuleStore, RegexRedirect};
use waypoint_redirector::{RedirectResolver, Redirector};
use waypoint_storage::{InMemoryRuleStore, MySqlRuleStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting gateway server"
    );

    let redirector = build_redirector(&config).await?;
    serve(config.listen_addr, AppState::new(redirector)).await
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormatArg::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn build_redirector(config: &CLI) -> Result<Arc<dyn Redirector>, BoxError> {
    match config.storage {
        StorageBackendArg::InMemory => {
            warn!("in-memory storage holds no rules; every request will pass through");
            let domains = Arc::new(InMemoryRuleStore::<DomainRedirect>::new());
            let paths = Arc::new(InMemoryRuleStore::<RegexRedirect>::new());
            with_cache(config, domains, paths).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let domains = MySqlRuleStore::<DomainRedirect>::connect(mysql_dsn).await?;
            let paths = MySqlRuleStore::<RegexRedirect>::new(domains.pool().clone());
            with_cache(config, Arc::new(domains), Arc::new(paths)).await
        }
    }
}

async fn with_cache<DS, PS>(
    config: &CLI,
    domains: Arc<DS>,
    paths: Arc<PS>,
) -> Result<Arc<dyn Redirector>, BoxError>
where
    DS: ReadRuleStore<DomainRedirect>,
    PS: ReadRuleStore<RegexRedirect>,
{
    match config.cache {
        CacheBackendArg::Memory => Ok(resolver(domains, paths, MokaIndexCache::new())),
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .ok_or("redis url is required when cache backend is redis")?;
            let client = redis::Client::open(redis_url)?;
            let conn = client.get_multiplexed_async_connection().await?;
            let cache = RedisIndexCache::with_prefix(conn, config.cache_prefix.as_str());
            Ok(resolver(domains, paths, cache))
        }
    }
}

fn resolver<DS, PS, C>(domains: Arc<DS>, paths: Arc<PS>, cache: C) -> Arc<dyn Redirector>
where
    DS: ReadRuleStore<DomainRedirect>,
    PS: ReadRuleStore<RegexRedirect>,
    C: IndexCache,
{
    Arc::new(RedirectResolver::from_stores(domains, paths, Arc::new(cache)))
}

async fn serve(listen_addr: SocketAddr, state: AppState) -> Result<(), BoxError> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
