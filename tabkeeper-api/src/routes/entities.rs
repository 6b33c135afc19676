/// Generic CRUD handlers
///
/// One implementation per operation, instantiated per entity type and store backend when
/// the router is built, e.g. `get(entities::list::<Order, S>)`.
///
/// # Endpoints (per entity)
///
/// - `GET    /<entity>` - List all records, ordered by id
/// - `POST   /<entity>` - Create from a draft payload
/// - `GET    /<entity>/:id` - Fetch one record
/// - `PUT    /<entity>/:id` - Merge a partial update
/// - `DELETE /<entity>/:id` - Remove a record
/// - `GET    /<entity>/date/:start_date/:end_date` - Records created within whole UTC days

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, Payload},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tabkeeper_shared::{
    models::{Entity, Timestamped},
    query::{parse_date, window::date_range},
    store::Store,
};
use tracing::info;

/// Body returned by delete handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

async fn fetch<E: Entity, S: Store>(store: &S, id: i64) -> ApiResult<E> {
    store
        .find::<E>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(E::LABEL, id))
}

/// List every record
pub async fn list<E: Entity, S: Store>(State(state): State<AppState<S>>) -> ApiResult<Json<Vec<E>>> {
    Ok(Json(state.store.list::<E>().await?))
}

/// Create a record
///
/// # Errors
///
/// - `400 Bad Request`: malformed JSON, missing or invalid fields
/// - `409 Conflict`: a unique column (user email) is taken
pub async fn create<E: Entity, S: Store>(
    State(state): State<AppState<S>>,
    Payload(draft): Payload<E::Draft>,
) -> ApiResult<Json<E>> {
    let record = E::from_draft(draft)?;
    let created = state.store.insert(record).await?;

    info!(entity = E::LABEL, id = created.id(), "Record created");
    Ok(Json(created))
}

/// Fetch one record by id
///
/// # Errors
///
/// - `400 Bad Request`: non-numeric id
/// - `404 Not Found`: no such record
pub async fn get_one<E: Entity, S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<E>> {
    let id = parse_id(&id)?;
    Ok(Json(fetch::<E, S>(&state.store, id).await?))
}

/// Merge a partial update into a record
///
/// Absent fields keep their stored value; the merged record is validated before it is
/// written.
///
/// # Errors
///
/// - `400 Bad Request`: non-numeric id, malformed payload, or invalid merged record
/// - `404 Not Found`: no such record
pub async fn update<E: Entity, S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Payload(patch): Payload<E::Patch>,
) -> ApiResult<Json<E>> {
    let id = parse_id(&id)?;
    let mut record = fetch::<E, S>(&state.store, id).await?;

    record.apply(patch)?;
    record.validate()?;

    let updated = state
        .store
        .update(record)
        .await?
        .ok_or_else(|| ApiError::not_found(E::LABEL, id))?;

    info!(entity = E::LABEL, id, "Record updated");
    Ok(Json(updated))
}

/// Delete a record
///
/// # Errors
///
/// - `400 Bad Request`: non-numeric id
/// - `404 Not Found`: no such record
pub async fn delete<E: Entity, S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    fetch::<E, S>(&state.store, id).await?;

    if !state.store.delete::<E>(id).await? {
        return Err(ApiError::not_found(E::LABEL, id));
    }

    info!(entity = E::LABEL, id, "Record deleted");
    Ok(Json(DeleteResponse {
        message: format!("{} deleted", E::LABEL),
    }))
}

/// Records created between two dates, both days included in full
///
/// Dates are `YYYY-MM-DD` in UTC. An end date before the start date yields an empty list.
///
/// # Errors
///
/// - `400 Bad Request`: unparsable date
pub async fn created_between<E: Timestamped, S: Store>(
    State(state): State<AppState<S>>,
    Path((start_date, end_date)): Path<(String, String)>,
) -> ApiResult<Json<Vec<E>>> {
    let start = parse_date(&start_date)?;
    let end = parse_date(&end_date)?;

    let records = state
        .store
        .select::<E>(&date_range(E::CREATED_COLUMN, start, end))
        .await?;

    Ok(Json(records))
}
