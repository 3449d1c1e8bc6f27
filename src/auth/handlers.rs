use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::SessionProfile,
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        jwt::{JwtKeys, TokenPair},
        password::{hash_password, verify_password},
        repo::{CreateUserError, User},
    },
    error::{AppError, AppResult},
    extract::JsonBody,
    forms::{FormKind, Validator},
    profile::{
        model::{Gender, ProfileRow, ProfileView},
        reconcile::reconcile,
    },
    state::AppState,
};

pub const AFTER_LOGIN_ROUTE: &str = "/profile";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Resolves the profile view for `user` and issues a session carrying it.
pub(crate) fn open_session(
    keys: &JwtKeys,
    user: &User,
    row: Option<&ProfileRow>,
    fallback: &SessionProfile,
) -> anyhow::Result<(ProfileView, TokenPair)> {
    let view = reconcile(user.id, Some(&user.email), row, fallback);
    let tokens = keys.issue(user.id, &SessionProfile::from(&view))?;
    Ok((view, tokens))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let mut v = Validator::default();
    let email = v.email("email", Some(&payload.email));
    let password = v.required("password", Some(&payload.password));
    let full_name = v.required("full_name", Some(&payload.full_name));
    let gender = v.choice::<Gender>("gender", Some(&payload.gender), "must be male or female");
    v.finish()?;
    let (Some(email), Some(password), Some(full_name), Some(gender)) =
        (email, password, full_name, gender)
    else {
        return Err(AppError::Validation(Vec::new()));
    };

    let _submission = state.gate.begin(FormKind::Register, email.as_str())?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }

    let hash = hash_password(password)?;
    let user = match state.users.create(&email, &hash).await {
        Ok(u) => u,
        Err(CreateUserError::EmailTaken) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict("Email already registered"));
        }
        Err(CreateUserError::Other(e)) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    let row = state
        .profiles
        .upsert(&ProfileRow {
            user_id: user.id,
            full_name: Some(full_name.to_string()),
            gender: Some(gender),
            avatar_url: None,
        })
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let (view, tokens) = open_session(&keys, &user, Some(&row), &SessionProfile::default())?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            tokens,
            user: view,
            message: "Registration successful",
            redirect_to: AFTER_LOGIN_ROUTE,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let mut v = Validator::default();
    let email = v.email("email", Some(&payload.email));
    let password = v.required("password", Some(&payload.password));
    v.finish()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(Vec::new()));
    };

    let _submission = state.gate.begin(FormKind::Login, email.as_str())?;

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let row = state.profiles.find(user.id).await?;
    let keys = JwtKeys::from_ref(&state);
    let (view, tokens) = open_session(&keys, &user, row.as_ref(), &SessionProfile::default())?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        tokens,
        user: view,
        message: "ล็อกอินสำเร็จ",
        redirect_to: AFTER_LOGIN_ROUTE,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthenticated
    })?;

    let Some(user) = state.users.find_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for unknown user");
        return Err(AppError::Unauthenticated);
    };
    let row = state.profiles.find(user.id).await?;
    let (view, tokens) = open_session(&keys, &user, row.as_ref(), &claims.profile)?;

    Ok(Json(AuthResponse {
        tokens,
        user: view,
        message: "Session refreshed",
        redirect_to: AFTER_LOGIN_ROUTE,
    }))
}
