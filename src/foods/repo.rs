use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::model::{FoodEntry, FoodFields, FoodRecord};
use crate::db::PgStore;

/// Every operation is scoped to the owning user; someone else's entry reads
/// as absent.
#[async_trait]
pub trait FoodStore: Send + Sync {
    /// Newest date first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<FoodEntry>>;
    async fn get(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<FoodEntry>>;
    async fn create(&self, user_id: Uuid, fields: &FoodFields) -> anyhow::Result<FoodEntry>;
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &FoodFields,
    ) -> anyhow::Result<Option<FoodEntry>>;
    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
impl FoodStore for PgStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<FoodEntry>> {
        let rows = sqlx::query_as::<_, FoodRecord>(
            r#"
            SELECT id, user_id, name, meal, date, image_url, created_at
            FROM foods
            WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list foods")?;
        rows.into_iter().map(FoodEntry::try_from).collect()
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<FoodEntry>> {
        let row = sqlx::query_as::<_, FoodRecord>(
            r#"
            SELECT id, user_id, name, meal, date, image_url, created_at
            FROM foods
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get food")?;
        row.map(FoodEntry::try_from).transpose()
    }

    async fn create(&self, user_id: Uuid, fields: &FoodFields) -> anyhow::Result<FoodEntry> {
        let row = sqlx::query_as::<_, FoodRecord>(
            r#"
            INSERT INTO foods (id, user_id, name, meal, date, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, meal, date, image_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&fields.name)
        .bind(fields.meal.db_value())
        .bind(fields.date)
        .bind(fields.image_url.as_deref())
        .fetch_one(&self.db)
        .await
        .context("insert food")?;
        row.try_into()
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: &FoodFields,
    ) -> anyhow::Result<Option<FoodEntry>> {
        let row = sqlx::query_as::<_, FoodRecord>(
            r#"
            UPDATE foods
               SET name = $3, meal = $4, date = $5, image_url = $6
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, meal, date, image_url, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&fields.name)
        .bind(fields.meal.db_value())
        .bind(fields.date)
        .bind(fields.image_url.as_deref())
        .fetch_optional(&self.db)
        .await
        .context("update food")?;
        row.map(FoodEntry::try_from).transpose()
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM foods WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete food")?;
        Ok(res.rows_affected() > 0)
    }
}
