mod dto;
pub mod handlers;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::profile_routes())
}
