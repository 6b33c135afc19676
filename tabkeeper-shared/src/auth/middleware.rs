/// Authentication gate for Axum
///
/// Validates the `Authorization` header of a request and turns it into an [`AuthContext`].
/// Both a bare token and `Bearer <token>` are accepted.
///
/// # Request Extensions
///
/// After successful authentication the gate adds:
/// - `AuthContext`: the authenticated user's id
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use tabkeeper_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(create_jwt_middleware("your-jwt-secret".to_string())));
/// ```

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{validate_token, JwtError};

/// Authentication context added to request extensions
///
/// Handlers take it as an extractor; extraction fails with 401 when the gate did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,
}

/// Error type for the authentication gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not a usable token string
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Missing authorization header"),
            AuthError::InvalidFormat(msg) => write!(f, "{}", msg),
            AuthError::InvalidToken(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid token issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The `Bearer` scheme prefix is optional. A bare `Bearer` with nothing after it counts as
/// an empty token.
pub fn token_from_header(value: &str) -> Result<&str, AuthError> {
    let value = value.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => value,
    };

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty authorization token".to_string()));
    }

    Ok(token)
}

/// Validates an optional `Authorization` header value
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if there is no header
/// - `AuthError::InvalidFormat` if the header is empty
/// - `AuthError::InvalidToken` for bad signatures, expired or foreign tokens
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let token = token_from_header(header)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}

/// JWT authentication middleware
///
/// Rejects the request with 401 before it reaches the handler when the header is missing
/// or the token does not validate; otherwise inserts [`AuthContext`] into the extensions.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| {
            v.to_str()
                .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid UTF-8".to_string()))
        })
        .transpose()?;

    let context = authenticate(header, &secret)?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Helper that captures the secret for use with `axum::middleware::from_fn`.
pub fn create_jwt_middleware(
    secret: String,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_from_header() {
        assert_eq!(token_from_header("Bearer abc").unwrap(), "abc");
        assert_eq!(token_from_header("abc").unwrap(), "abc");
        assert_eq!(token_from_header("  abc  ").unwrap(), "abc");
        assert!(matches!(
            token_from_header("Bearer "),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(token_from_header("").is_err());
        assert!(matches!(
            token_from_header("  Bearer   "),
            Err(AuthError::InvalidFormat(_))
        ));
        assert_eq!(token_from_header("Bearer\tabc").unwrap(), "abc");
        assert_eq!(token_from_header("Bearerabc").unwrap(), "Bearerabc");
    }

    #[test]
    fn test_authenticate_accepts_both_forms() {
        let token = create_token(&Claims::new(5), SECRET).unwrap();

        let bare = authenticate(Some(&token), SECRET).unwrap();
        let bearer = authenticate(Some(&format!("Bearer {}", token)), SECRET).unwrap();

        assert_eq!(bare.user_id, 5);
        assert_eq!(bare, bearer);
    }

    #[test]
    fn test_authenticate_failures() {
        assert_eq!(
            authenticate(None, SECRET),
            Err(AuthError::MissingCredentials)
        );

        let expired = create_token(&Claims::with_expiration(1, Duration::hours(-1)), SECRET).unwrap();
        assert_eq!(
            authenticate(Some(&expired), SECRET),
            Err(AuthError::InvalidToken("Token expired".to_string()))
        );

        let forged = create_token(&Claims::new(1), "another-secret-that-is-long-enough!!").unwrap();
        assert!(matches!(
            authenticate(Some(&forged), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidFormat("bad".to_string()),
            AuthError::InvalidToken("bad".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
