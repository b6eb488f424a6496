use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outstanding or historical magic-link token.
#[derive(Debug, Clone, FromRow)]
pub struct MagicLinkToken {
    pub token: String,
    pub email: String,
    pub expires_at: OffsetDateTime,
    pub consumed: bool,
    pub created_at: OffsetDateTime,
}

impl MagicLinkToken {
    pub fn is_redeemable(&self, now: OffsetDateTime) -> bool {
        !self.consumed && now < self.expires_at
    }
}
