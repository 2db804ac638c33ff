use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, not_found_handler, redirect_middleware};
use crate::state::AppState;

pub struct App {}

impl App {
    /// `/health` is served directly; every other request runs the redirect
    /// check before reaching the not-found fallback.
    pub fn router(state: AppState) -> Router {
        let redirecting = Router::new()
            .fallback(not_found_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                redirect_middleware,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .merge(redirecting)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
