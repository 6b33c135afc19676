/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// Both are generic over the [`Store`] backend: the server runs on
/// [`PgStore`](tabkeeper_shared::store::postgres::PgStore), tests on
/// [`MemoryStore`](tabkeeper_shared::store::memory::MemoryStore).
///
/// # Example
///
/// ```no_run
/// use tabkeeper_api::{app::{build_router, AppState}, config::Config};
/// use tabkeeper_shared::store::postgres::PgStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(PgStore::new(pool), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::request_log::log_requests};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tabkeeper_shared::{
    auth::middleware::create_jwt_middleware,
    models::{Order, Payment, Ticket, User},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// The store handle and the `Arc`ed config are both cheap to clone.
#[derive(Clone)]
pub struct AppState<S> {
    /// Storage backend
    pub store: S,

    /// Application configuration
    pub config: Arc<Config>,
}

impl<S: Store> AppState<S> {
    /// Creates new application state
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                          # public
/// ├── POST /signup                          # public
/// ├── POST /login                           # public
/// ├── /users                                # GET, POST
/// │   ├── /:id                              # GET, PUT, DELETE
/// │   ├── /range/:start_id/:end_id          # GET
/// │   └── /byname/:name                     # GET
/// ├── /tickets                              # GET, POST
/// │   ├── /id/:id                           # GET, PUT, DELETE
/// │   ├── /:user_id                         # GET
/// │   ├── /date/:start_date/:end_date       # GET
/// │   ├── /date/time/:start_date/:end_date  # GET
/// │   └── /payment/:status                  # GET
/// ├── /orders, /payments                    # GET, POST
/// │   ├── /:id                              # GET, PUT, DELETE
/// │   └── /date/:start_date/:end_date       # GET
/// └── /records
///     ├── /date/:date_created               # GET
///     └── /:date/:start_time/:end_time      # GET
/// ```
///
/// # Middleware Stack
///
/// Applied in order (innermost first):
/// 1. Authentication (protected routes only; bare token or `Bearer <token>`)
/// 2. Per-request spans (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Request log line (method, path, origin, status, latency)
///
/// Unmatched paths and unsupported methods answer with the usual `{"error"}` body.
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    use crate::routes::{auth, entities, health, records, tickets, users};

    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/health", get(health::health_check::<S>))
        .route("/signup", post(entities::create::<User, S>))
        .route("/login", post(auth::login::<S>));

    let user_routes = Router::new()
        .route("/", get(entities::list::<User, S>).post(entities::create::<User, S>))
        .route(
            "/:id",
            get(entities::get_one::<User, S>)
                .put(entities::update::<User, S>)
                .delete(entities::delete::<User, S>),
        )
        .route("/range/:start_id/:end_id", get(users::by_id_range::<S>))
        .route("/byname/:name", get(users::by_name::<S>));

    let ticket_routes = Router::new()
        .route("/", get(entities::list::<Ticket, S>).post(entities::create::<Ticket, S>))
        .route(
            "/id/:id",
            get(entities::get_one::<Ticket, S>)
                .put(entities::update::<Ticket, S>)
                .delete(entities::delete::<Ticket, S>),
        )
        .route("/:user_id", get(tickets::by_user::<S>))
        .route(
            "/date/:start_date/:end_date",
            get(entities::created_between::<Ticket, S>),
        )
        .route(
            "/date/time/:start_date/:end_date",
            get(tickets::by_date_time::<S>),
        )
        .route("/payment/:status", get(tickets::by_payment_status::<S>));

    let order_routes = Router::new()
        .route("/", get(entities::list::<Order, S>).post(entities::create::<Order, S>))
        .route(
            "/:id",
            get(entities::get_one::<Order, S>)
                .put(entities::update::<Order, S>)
                .delete(entities::delete::<Order, S>),
        )
        .route(
            "/date/:start_date/:end_date",
            get(entities::created_between::<Order, S>),
        );

    let payment_routes = Router::new()
        .route("/", get(entities::list::<Payment, S>).post(entities::create::<Payment, S>))
        .route(
            "/:id",
            get(entities::get_one::<Payment, S>)
                .put(entities::update::<Payment, S>)
                .delete(entities::delete::<Payment, S>),
        )
        .route(
            "/date/:start_date/:end_date",
            get(entities::created_between::<Payment, S>),
        );

    let record_routes = Router::new()
        .route("/date/:date_created", get(records::by_date::<S>))
        .route("/:date/:start_time/:end_time", get(records::by_date_time::<S>));

    // Everything below requires a valid token
    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tickets", ticket_routes)
        .nest("/orders", order_routes)
        .nest("/payments", payment_routes)
        .nest("/records", record_routes)
        .layer(middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let cors = if state.config.cors_is_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// JSON 404 for paths no route matches
async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// JSON 405 for a known path hit with an unsupported method
async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}
