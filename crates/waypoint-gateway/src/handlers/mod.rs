mod health;
mod redirect;

pub use health::health_handler;
pub use redirect::{not_found_handler, redirect_middleware};
