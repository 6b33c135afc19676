/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /signup` - Create a user (same payload and rules as `POST /users`)
/// - `POST /login` - Exchange credentials for an access token
///
/// Signup is routed straight to the generic create handler for users; only login lives
/// here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Payload,
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tabkeeper_shared::{
    auth::{
        jwt::{create_token, Claims},
        password::verify_password,
    },
    models::User,
    store::Store,
};
use tracing::{info, warn};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token (72h)
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "name": "A",
///   "email": "a@x.com",
///   "password": "p"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ..."
/// }
/// ```
///
/// The token's subject is the id of the user the credentials belong to.
///
/// # Errors
///
/// - `400 Bad Request`: missing or empty field
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Payload(req): Payload<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state
        .store
        .select::<User>(&User::by_email(&req.email))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            warn!("Login attempt for unknown email");
            invalid_credentials()
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(invalid_credentials());
    }

    let token = create_token(&Claims::new(user.id), state.jwt_secret())?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}
