use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::db::PgStore;

/// Persistence for users and magic-link tokens.
#[async_trait]
pub trait AuthRepo: Send + Sync {
    /// Store a fresh token for `email`, superseding any older unconsumed token.
    async fn issue_magic_link(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Consume `token` if it is unconsumed and unexpired at `now`, and return the
    /// user for its email, creating it on first use. `None` when the token is
    /// unknown, consumed or expired.
    async fn redeem_magic_link(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

#[async_trait]
impl AuthRepo for PgStore {
    async fn issue_magic_link(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            UPDATE magic_link_tokens
               SET consumed = TRUE
             WHERE email = $1 AND NOT consumed
            "#,
        )
        .bind(email)
        .execute(&mut *tx)
        .await
        .context("supersede magic links")?;

        sqlx::query(
            r#"
            INSERT INTO magic_link_tokens (token, email, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(email)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .context("insert magic link")?;

        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn redeem_magic_link(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        // Single conditional update: concurrent redemptions of one token can't both match.
        let email: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE magic_link_tokens
               SET consumed = TRUE
             WHERE token = $1 AND NOT consumed AND expires_at > $2
            RETURNING email
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .context("consume magic link")?;

        let Some(email) = email else {
            tx.rollback().await.context("rollback tx")?;
            return Ok(None);
        };

        let user = find_or_create_user_tx(&mut tx, &email).await?;
        tx.commit().await.context("commit tx")?;
        Ok(Some(user))
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user")?;
        Ok(user)
    }
}

async fn find_or_create_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> anyhow::Result<User> {
    // The no-op update makes RETURNING yield the existing row on conflict.
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email)
        VALUES ($1)
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING id, email, created_at
        "#,
    )
    .bind(email)
    .fetch_one(&mut **tx)
    .await
    .context("find or create user")?;
    Ok(user)
}
