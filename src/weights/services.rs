use std::time::Duration;

use bytes::Bytes;
use time::{
    format_description::well_known::{Iso8601, Rfc3339},
    Date, OffsetDateTime, PrimitiveDateTime,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    repo::WeightRepo,
    repo_types::{EntryMethod, TimeRange, WeightEntry},
};
use crate::{
    error::{AppError, Result},
    ocr::{self, OcrEngine},
};

/// Manual readings must be strictly between these bounds, in kg.
const MANUAL_MIN_KG: f64 = 0.0;
const MANUAL_MAX_KG: f64 = 1000.0;

fn validate_manual(weight: f64) -> Result<f64> {
    if !weight.is_finite() || weight <= MANUAL_MIN_KG || weight >= MANUAL_MAX_KG {
        return Err(AppError::Validation(format!(
            "weight must be a number between {MANUAL_MIN_KG} and {MANUAL_MAX_KG} kg"
        )));
    }
    Ok(weight)
}

/// Record a reading for `user_id` from exactly one of a typed weight or a photo.
pub async fn submit_weight(
    repo: &dyn WeightRepo,
    engine: &dyn OcrEngine,
    ocr_timeout: Duration,
    user_id: Uuid,
    manual: Option<f64>,
    image: Option<Bytes>,
) -> Result<WeightEntry> {
    let (weight, method) = match (manual, image) {
        (Some(w), None) => (validate_manual(w)?, EntryMethod::Manual),
        (None, Some(img)) => {
            let w = ocr::extract_weight(engine, img, ocr_timeout).await?;
            (w, EntryMethod::Ocr)
        }
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Provide either weight or image, not both".into(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "Either weight or image must be provided".into(),
            ))
        }
    };

    let entry = WeightEntry {
        id: Uuid::new_v4(),
        user_id,
        weight,
        timestamp: OffsetDateTime::now_utc(),
        method,
    };
    let saved = repo.insert(&entry).await?;
    info!(%user_id, entry_id = %saved.id, method = saved.method.as_str(), weight, "weight recorded");
    Ok(saved)
}

/// Parse an ISO-8601 bound. Offsets (including `Z`) are honoured, a date-time
/// without offset is UTC, a bare date is midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(t);
    }
    if let Ok(t) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Ok(t);
    }
    if let Ok(t) = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Ok(t.assume_utc());
    }
    if let Ok(d) = Date::parse(raw, &Iso8601::DEFAULT) {
        return Ok(d.midnight().assume_utc());
    }
    Err(AppError::Validation(format!("invalid timestamp {raw:?}")))
}

pub fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
    let range = TimeRange {
        start: start.filter(|s| !s.trim().is_empty()).map(parse_timestamp).transpose()?,
        end: end.filter(|s| !s.trim().is_empty()).map(parse_timestamp).transpose()?,
    };
    if let (Some(s), Some(e)) = (range.start, range.end) {
        if s > e {
            return Err(AppError::Validation("start must not be after end".into()));
        }
    }
    Ok(range)
}

pub async fn list_weights(
    repo: &dyn WeightRepo,
    user_id: Uuid,
    range: TimeRange,
) -> Result<Vec<WeightEntry>> {
    Ok(repo.list_for_user(user_id, range).await?)
}

/// Delete an entry owned by `user_id`.
pub async fn delete_weight(repo: &dyn WeightRepo, user_id: Uuid, id: Uuid) -> Result<Uuid> {
    let entry = repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Weight entry not found".into()))?;

    if entry.user_id != user_id {
        warn!(%user_id, entry_id = %id, "delete of foreign entry refused");
        return Err(AppError::Forbidden);
    }

    // a concurrent delete may have won since the lookup
    if !repo.delete_owned(id, user_id).await? {
        return Err(AppError::NotFound("Weight entry not found".into()));
    }
    info!(%user_id, entry_id = %id, "weight entry deleted");
    Ok(id)
}
