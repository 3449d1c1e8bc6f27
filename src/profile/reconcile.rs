//! Builds one [`ProfileView`] out of the places profile data can live.
//!
//! Each field is resolved independently through an ordered list of sources;
//! the first non-empty value wins and a field nobody knows ends up as `""`.

use uuid::Uuid;

use crate::auth::claims::SessionProfile;

use super::model::{ProfileRow, ProfileView};

fn first_non_empty<'a, I>(sources: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    sources
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// `account_email` is the login key from the credentials table; the profile
/// table never holds an email.
pub fn reconcile(
    user_id: Uuid,
    account_email: Option<&str>,
    row: Option<&ProfileRow>,
    session: &SessionProfile,
) -> ProfileView {
    ProfileView {
        id: user_id,
        email: first_non_empty([account_email, Some(session.email.as_str())]),
        full_name: first_non_empty([
            row.and_then(|r| r.full_name.as_deref()),
            session.full_name.as_deref(),
        ]),
        gender: first_non_empty([
            row.and_then(|r| r.gender).map(|g| g.as_str()),
            session.gender.map(|g| g.as_str()),
        ]),
        avatar_url: first_non_empty([
            row.and_then(|r| r.avatar_url.as_deref()),
            session.avatar_url.as_deref(),
        ]),
    }
}

impl From<&ProfileView> for SessionProfile {
    fn from(v: &ProfileView) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            email: v.email.clone(),
            full_name: non_empty(&v.full_name),
            gender: v.gender.parse().ok(),
            avatar_url: non_empty(&v.avatar_url),
        }
    }
}
