use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    dto::{DeletedResponse, ListQuery, WeightEntryResponse},
    services,
};
use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/weights", get(list_weights))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/weight", post(submit_weight))
        .route("/weight/:id", delete(delete_weight))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Fields of the `POST /weight` multipart form after boundary checks.
#[derive(Debug, Default)]
struct WeightForm {
    weight: Option<f64>,
    image: Option<Bytes>,
}

fn accepts_content_type(ct: Option<&str>) -> bool {
    match ct {
        None => true,
        Some(ct) => ct.starts_with("image/") || ct == "application/octet-stream",
    }
}

async fn read_form(mut mp: Multipart) -> Result<WeightForm> {
    let mut form = WeightForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("weight") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed weight field: {e}")))?;
                let raw = raw.trim();
                // empty input means the field was left blank
                if raw.is_empty() {
                    continue;
                }
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| AppError::Validation(format!("weight {raw:?} is not a number")))?;
                form.weight = Some(value);
            }
            Some("image") => {
                if !accepts_content_type(field.content_type()) {
                    return Err(AppError::Validation("image must be an image file".into()));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed image field: {e}")))?;
                // browsers send an empty part when no file was picked
                if !data.is_empty() {
                    form.image = Some(data);
                }
            }
            other => debug!(field = ?other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

#[instrument(skip(state, mp))]
pub async fn submit_weight(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<Json<WeightEntryResponse>> {
    let form = read_form(mp).await?;
    let entry = services::submit_weight(
        state.weights.as_ref(),
        state.ocr.as_ref(),
        Duration::from_secs(state.config.ocr.timeout_secs),
        user_id,
        form.weight,
        form.image,
    )
    .await?;
    Ok(Json(entry.into()))
}

#[instrument(skip(state))]
pub async fn list_weights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<WeightEntryResponse>>> {
    let range = services::parse_range(q.start.as_deref(), q.end.as_deref())?;
    let entries = services::list_weights(state.weights.as_ref(), user_id, range).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn delete_weight(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let id = services::delete_weight(state.weights.as_ref(), user_id, id).await?;
    Ok(Json(DeletedResponse { id }))
}
