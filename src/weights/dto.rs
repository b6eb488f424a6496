use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{EntryMethod, WeightEntry};

/// Wire shape of a weight entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct WeightEntryResponse {
    pub id: Uuid,
    pub weight: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub method: EntryMethod,
}

impl From<WeightEntry> for WeightEntryResponse {
    fn from(e: WeightEntry) -> Self {
        Self {
            id: e.id,
            weight: e.weight,
            timestamp: e.timestamp,
            method: e.method,
        }
    }
}

/// Query for `GET /weights`. Bounds are ISO-8601 strings parsed by the service.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}
