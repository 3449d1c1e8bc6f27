use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::{SessionProfile, TokenKind},
    jwt::JwtKeys,
};
use crate::error::AppError;

/// The signed-in user, handed to every protected handler.
///
/// Built from a bearer access token whose signature, issuer, audience and
/// expiry have all been checked. Anything else rejects the request with a
/// redirect to the login page before the handler runs.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub profile: SessionProfile,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthenticated)?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::Unauthenticated);
            }
        };

        if claims.kind != TokenKind::Access {
            warn!(user_id = %claims.sub, "refresh token used as session");
            return Err(AppError::Unauthenticated);
        }

        Ok(Session {
            user_id: claims.sub,
            profile: claims.profile,
        })
    }
}
