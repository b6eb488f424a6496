use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::weights::repo_types::{TimeRange, WeightEntry, WeightEntryRow};

#[async_trait]
pub trait WeightRepo: Send + Sync {
    async fn insert(&self, entry: &WeightEntry) -> anyhow::Result<WeightEntry>;

    /// Entries of `user_id` inside `range`, oldest first.
    async fn list_for_user(&self, user_id: Uuid, range: TimeRange)
        -> anyhow::Result<Vec<WeightEntry>>;

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<WeightEntry>>;

    /// Delete the entry only if `user_id` owns it. Returns whether a row went away.
    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
impl WeightRepo for PgStore {
    async fn insert(&self, entry: &WeightEntry) -> anyhow::Result<WeightEntry> {
        let row = sqlx::query_as::<_, WeightEntryRow>(
            r#"
            INSERT INTO weight_entries (id, user_id, weight, recorded_at, method)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, weight, recorded_at, method
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.weight)
        .bind(entry.timestamp)
        .bind(entry.method.as_str())
        .fetch_one(&self.pool)
        .await
        .context("insert weight entry")?;
        row.try_into()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        range: TimeRange,
    ) -> anyhow::Result<Vec<WeightEntry>> {
        let rows = sqlx::query_as::<_, WeightEntryRow>(
            r#"
            SELECT id, user_id, weight, recorded_at, method
              FROM weight_entries
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL OR recorded_at >= $2)
               AND ($3::timestamptz IS NULL OR recorded_at <= $3)
             ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .context("list weight entries")?;

        rows.into_iter().map(WeightEntry::try_from).collect()
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<WeightEntry>> {
        let row = sqlx::query_as::<_, WeightEntryRow>(
            r#"
            SELECT id, user_id, weight, recorded_at, method
              FROM weight_entries
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find weight entry")?;
        row.map(WeightEntry::try_from).transpose()
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM weight_entries
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("delete weight entry")?;
        Ok(res.rows_affected() > 0)
    }
}
