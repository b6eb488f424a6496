use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// How a weight reading was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    Manual,
    Ocr,
}

impl EntryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryMethod::Manual => "manual",
            EntryMethod::Ocr => "ocr",
        }
    }
}

impl std::str::FromStr for EntryMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(EntryMethod::Manual),
            "ocr" => Ok(EntryMethod::Ocr),
            other => anyhow::bail!("unknown entry method {other:?}"),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WeightEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub weight: f64,
    pub recorded_at: OffsetDateTime,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub weight: f64,
    pub timestamp: OffsetDateTime,
    pub method: EntryMethod,
}

impl TryFrom<WeightEntryRow> for WeightEntry {
    type Error = anyhow::Error;

    fn try_from(r: WeightEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            weight: r.weight,
            timestamp: r.recorded_at,
            method: r.method.parse()?,
        })
    }
}

/// Inclusive timestamp bounds for listing; either side may be open.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl TimeRange {
    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t <= e)
    }
}
