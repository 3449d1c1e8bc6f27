use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::model::{Gender, ProfileRow};
use crate::{
    auth::password::hash_password,
    forms::is_blank,
    images::{ImageSelection, AVATAR_FOLDER},
    state::AppState,
};

/// A validated submission of the profile form.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub gender: Gender,
    /// Blank or whitespace-only keeps the stored hash.
    pub password: String,
    pub image: ImageSelection,
}

/// Runs the save steps in order: avatar upload, password, profile row.
///
/// A failing step stops the ones after it. Earlier steps stay applied, so an
/// avatar uploaded before a later failure is left in the bucket.
#[instrument(skip(state, update))]
pub async fn save_profile(
    state: &AppState,
    user_id: Uuid,
    update: ProfileUpdate,
) -> anyhow::Result<ProfileRow> {
    let uploaded = update.image.has_new_file();
    let avatar_url = update
        .image
        .resolve(state.storage.as_ref(), AVATAR_FOLDER, user_id)
        .await?;

    let orphaned = |step: &str| {
        if uploaded {
            warn!(
                user_id = %user_id,
                avatar_url = ?avatar_url,
                step,
                "profile save failed after avatar upload; object left in storage"
            );
        }
    };

    if !is_blank(&update.password) {
        let hash = hash_password(&update.password)?;
        if let Err(e) = state.users.update_password(user_id, &hash).await {
            orphaned("password");
            return Err(e);
        }
        info!(user_id = %user_id, "password updated");
    }

    let row = ProfileRow {
        user_id,
        full_name: Some(update.full_name),
        gender: Some(update.gender),
        avatar_url: avatar_url.clone(),
    };
    match state.profiles.upsert(&row).await {
        Ok(saved) => {
            info!(user_id = %user_id, "profile saved");
            Ok(saved)
        }
        Err(e) => {
            orphaned("profile");
            Err(e)
        }
    }
}
