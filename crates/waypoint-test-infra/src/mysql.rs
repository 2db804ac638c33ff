use std::time::Duration;

use crate::{Result, TestInfraError};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const DATABASE: &str = "waypoint";
const USER: &str = "waypoint";
const PASSWORD: &str = "waypoint";

/// How a [`MySqlDatabase`] is prepared before tests get its pool.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MySqlConfig {
    /// Statements run in order once the server accepts connections.
    #[builder(default)]
    schema: &'static [&'static str],
    #[builder(default = 5)]
    max_connections: u32,
    /// The server logs "ready" before it accepts TCP clients, so the first
    /// connects usually fail.
    #[builder(default = 20)]
    connect_attempts: u32,
    #[builder(default = Duration::from_millis(500))]
    retry_delay: Duration,
}

/// A disposable MySQL server with the configured schema applied.
pub struct MySqlDatabase {
    _container: ContainerAsync<GenericImage>,
    pool: MySqlPool,
}

impl MySqlDatabase {
    /// Starts the container, waits until it accepts connections and runs
    /// the schema statements.
    pub async fn start(config: MySqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(3306_u16.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", DATABASE)
            .with_env_var("MYSQL_USER", USER)
            .with_env_var("MYSQL_PASSWORD", PASSWORD)
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(3306).await?;
        let url = format!("mysql://{USER}:{PASSWORD}@{host}:{port}/{DATABASE}");

        let pool = connect_with_retry(&url, &config).await?;
        for (index, statement) in config.schema.iter().enumerate() {
            sqlx::query(*statement)
                .execute(&pool)
                .await
                .map_err(|source| TestInfraError::Schema { index, source })?;
        }

        Ok(Self {
            _container: container,
            pool,
        })
    }

    /// A pool on the fixture database. Clones share connections.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

async fn connect_with_retry(url: &str, config: &MySqlConfig) -> Result<MySqlPool> {
    let mut attempt = 1;

    loop {
        let connected = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await;

        match connected {
            Ok(pool) => return Ok(pool),
            Err(source) if attempt >= config.connect_attempts => {
                return Err(TestInfraError::Connect {
                    attempts: attempt,
                    source,
                });
            }
            Err(_) => {
                attempt += 1;
                tokio::time::sleep(config.retry_delay).await;
            }
        }
    }
}
