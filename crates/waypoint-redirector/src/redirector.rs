use crate::Result;
use async_trait::async_trait;
use waypoint_core::{RedirectDecision, RedirectRequest};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Decides whether the request should be redirected.
    /// Returns `None` if no rule matches.
    async fn resolve(&self, request: &RedirectRequest) -> Result<Option<RedirectDecision>>;
}
