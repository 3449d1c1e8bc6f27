pub mod handlers;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub use services::{ImageSelection, SelectedImage};

/// Object-storage folder for food photos.
pub const FOOD_FOLDER: &str = "foods";
/// Object-storage folder for profile pictures.
pub const AVATAR_FOLDER: &str = "avatars";

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::image_routes())
}
