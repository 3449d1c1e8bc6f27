use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => anyhow::bail!("unknown gender {:?}", other),
        }
    }
}

/// Row of the `profiles` table. Every column but the key may be unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct ProfileRecord {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl From<ProfileRecord> for ProfileRow {
    fn from(r: ProfileRecord) -> Self {
        Self {
            user_id: r.user_id,
            full_name: r.full_name,
            // an unrecognised stored value reads as unset
            gender: r.gender.and_then(|g| g.parse().ok()),
            avatar_url: r.avatar_url,
        }
    }
}

/// What the profile form is populated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub gender: String,
    pub avatar_url: String,
}
