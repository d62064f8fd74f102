//! The HTTP surface: routes, handlers and error pages.

mod app;
mod error;
mod handlers;
mod state;

pub use app::create_router;
pub use state::AppState;
