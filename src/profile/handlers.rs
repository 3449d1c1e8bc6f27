use axum::{
    extract::{FromRef, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::ProfileSaved,
    model::{Gender, ProfileView},
    reconcile::reconcile,
    services::{save_profile, ProfileUpdate},
};
use crate::{
    auth::{handlers::open_session, jwt::JwtKeys, repo::User, Session},
    error::{AppError, AppResult},
    forms::{FormKind, MultipartForm, Validator, DASHBOARD_ROUTE},
    images::ImageSelection,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

/// The credentials row must still exist for the session to count.
async fn account(state: &AppState, session: &Session) -> AppResult<User> {
    match state.users.find_by_id(session.user_id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %session.user_id, "session for a deleted account");
            Err(AppError::Unauthenticated)
        }
    }
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ProfileView>> {
    let user = account(&state, &session).await?;
    let row = state.profiles.find(user.id).await?;
    Ok(Json(reconcile(
        user.id,
        Some(&user.email),
        row.as_ref(),
        &session.profile,
    )))
}

#[instrument(skip(state, session, form), fields(user_id = %session.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    mut form: MultipartForm,
) -> AppResult<Json<ProfileSaved>> {
    let mut v = Validator::default();
    let full_name = v.required("full_name", form.text("full_name")).map(str::to_string);
    let gender = v.choice::<Gender>("gender", form.text("gender"), "must be male or female");
    form.check_image(&mut v);
    v.finish()?;
    let (Some(full_name), Some(gender)) = (full_name, gender) else {
        return Err(AppError::Validation(Vec::new()));
    };
    // `email` is display-only on this form
    let password = form.text("password").unwrap_or_default().to_string();

    let _submission = state
        .gate
        .begin(FormKind::EditProfile, session.user_id.to_string())?;

    let user = account(&state, &session).await?;
    let row = state.profiles.find(user.id).await?;
    let before = reconcile(user.id, Some(&user.email), row.as_ref(), &session.profile);

    let mut image =
        ImageSelection::with_existing(Some(before.avatar_url).filter(|u| !u.is_empty()));
    if let Some(file) = form.image.take() {
        image.select(Some(file));
    }

    let saved = save_profile(
        &state,
        user.id,
        ProfileUpdate {
            full_name,
            gender,
            password,
            image,
        },
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let (profile, tokens) = open_session(&keys, &user, Some(&saved), &session.profile)?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(ProfileSaved {
        message: "Profile has been updated!",
        profile,
        tokens,
        redirect_to: DASHBOARD_ROUTE,
    }))
}
