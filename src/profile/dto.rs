use serde::Serialize;

use super::model::ProfileView;
use crate::auth::jwt::TokenPair;

#[derive(Debug, Serialize)]
pub struct ProfileSaved {
    pub message: &'static str,
    pub profile: ProfileView,
    /// The session is re-issued so it carries the saved profile.
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub redirect_to: &'static str,
}
