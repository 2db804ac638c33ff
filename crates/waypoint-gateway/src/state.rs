use std::sync::Arc;

use waypoint_redirector::Redirector;

#[derive(Clone)]
pub struct AppState {
    redirector: Arc<dyn Redirector>,
}

impl AppState {
    pub fn new(redirector: Arc<dyn Redirector>) -> Self {
        Self { redirector }
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }
}
