/// User lookups beyond plain CRUD
///
/// # Endpoints
///
/// - `GET /users/range/:start_id/:end_id` - Users with `start_id <= id <= end_id`
/// - `GET /users/byname/:name` - Users with exactly this name

use crate::{app::AppState, error::ApiResult, extract::parse_id};
use axum::{
    extract::{Path, State},
    Json,
};
use tabkeeper_shared::{
    models::{Entity, User},
    query::{Condition, Filter, SqlValue},
    store::Store,
};

/// Users whose id lies in an inclusive range
///
/// Inverted bounds return an empty list.
pub async fn by_id_range<S: Store>(
    State(state): State<AppState<S>>,
    Path((start_id, end_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<User>>> {
    let start = parse_id(&start_id)?;
    let end = parse_id(&end_id)?;

    let filter = Filter::new()
        .and(Condition::Gte(User::ID_COLUMN, SqlValue::Int(start)))
        .and(Condition::Lte(User::ID_COLUMN, SqlValue::Int(end)));

    Ok(Json(state.store.select(&filter).await?))
}

/// Users with an exact name match
pub async fn by_name<S: Store>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.select(&User::by_name(&name)).await?))
}
