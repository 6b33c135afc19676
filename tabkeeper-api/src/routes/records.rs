/// Records join endpoints
///
/// # Endpoints
///
/// - `GET /records/date/:date_created` - Everything on tickets opened on one UTC day
/// - `GET /records/:date/:start_time/:end_time` - Same, limited to a time-of-day span
///
/// # Response
///
/// ```json
/// {
///   "users": [...],
///   "tickets": [...],
///   "orders": [...],
///   "payments": [...]
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use tabkeeper_shared::{
    models::{Order, Payment, Ticket, User},
    query::Window,
    records::{fetch_records, Records},
    store::Store,
};

/// Joined view over the four tables
pub type TabRecords = Records<User, Ticket, Order, Payment>;

async fn join<S: Store>(store: &S, window: Window) -> ApiResult<Json<TabRecords>> {
    let records = fetch_records::<S, User, Ticket, Order, Payment>(store, &window).await?;
    Ok(Json(records))
}

/// Records for tickets created on one day
pub async fn by_date<S: Store>(
    State(state): State<AppState<S>>,
    Path(date_created): Path<String>,
) -> ApiResult<Json<TabRecords>> {
    join(&state.store, Window::day(&date_created)?).await
}

/// Records for tickets created on one day between two times of day
pub async fn by_date_time<S: Store>(
    State(state): State<AppState<S>>,
    Path((date, start_time, end_time)): Path<(String, String, String)>,
) -> ApiResult<Json<TabRecords>> {
    join(&state.store, Window::day_time(&date, &start_time, &end_time)?).await
}
