/// Ticket lookups beyond plain CRUD
///
/// # Endpoints
///
/// - `GET /tickets/:user_id` - Tickets owned by a user
/// - `GET /tickets/date/time/:start/:end` - Tickets created in an inclusive
///   `YYYY-MM-DD HH:MM:SS` range (UTC)
/// - `GET /tickets/payment/:status` - `paid` or `unpaid` tickets

use crate::{app::AppState, error::ApiResult, extract::parse_id};
use axum::{
    extract::{Path, State},
    Json,
};
use tabkeeper_shared::{
    models::{ticket::PaymentStatus, Ticket, Timestamped},
    query::{parse_date_time, window::timestamp_range},
    store::Store,
};

/// Tickets owned by a user
pub async fn by_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let user_id = parse_id(&user_id)?;
    Ok(Json(state.store.select(&Ticket::by_user(user_id)).await?))
}

/// Tickets created between two date-times, both ends included
pub async fn by_date_time<S: Store>(
    State(state): State<AppState<S>>,
    Path((start, end)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let start = parse_date_time(&start)?;
    let end = parse_date_time(&end)?;

    let filter = timestamp_range(Ticket::CREATED_COLUMN, start, end);
    Ok(Json(state.store.select(&filter).await?))
}

/// Tickets by payment status
///
/// # Errors
///
/// - `400 Bad Request`: status other than `paid` or `unpaid`
pub async fn by_payment_status<S: Store>(
    State(state): State<AppState<S>>,
    Path(status): Path<String>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let status: PaymentStatus = status.parse()?;
    Ok(Json(state.store.select(&status.filter()).await?))
}
