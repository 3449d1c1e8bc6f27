use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::model::{ProfileRecord, ProfileRow};
use crate::db::PgStore;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, user_id: Uuid) -> anyhow::Result<Option<ProfileRow>>;
    /// Inserts the row or overwrites every column of the existing one.
    async fn upsert(&self, row: &ProfileRow) -> anyhow::Result<ProfileRow>;
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find(&self, user_id: Uuid) -> anyhow::Result<Option<ProfileRow>> {
        let rec = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT user_id, full_name, gender, avatar_url, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find profile")?;
        Ok(rec.map(ProfileRow::from))
    }

    async fn upsert(&self, row: &ProfileRow) -> anyhow::Result<ProfileRow> {
        let rec = sqlx::query_as::<_, ProfileRecord>(
            r#"
            INSERT INTO profiles (user_id, full_name, gender, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
               SET full_name = EXCLUDED.full_name,
                   gender = EXCLUDED.gender,
                   avatar_url = EXCLUDED.avatar_url,
                   updated_at = now()
            RETURNING user_id, full_name, gender, avatar_url, updated_at
            "#,
        )
        .bind(row.user_id)
        .bind(row.full_name.as_deref())
        .bind(row.gender.map(|g| g.as_str()))
        .bind(row.avatar_url.as_deref())
        .fetch_one(&self.db)
        .await
        .context("upsert profile")?;
        Ok(rec.into())
    }
}
