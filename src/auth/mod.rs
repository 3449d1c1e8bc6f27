use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub use extractors::Session;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
