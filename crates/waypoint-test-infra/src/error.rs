use thiserror::Error;

/// Failures while bringing up a fixture.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container did not start: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("mysql refused connections after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("schema statement {index} failed: {source}")]
    Schema {
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
