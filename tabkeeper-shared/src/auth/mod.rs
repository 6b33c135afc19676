/// Authentication utilities
///
/// This module provides the authentication primitives for tabkeeper:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: the `Authorization` header gate and [`middleware::AuthContext`]
///
/// # Example
///
/// ```
/// use tabkeeper_shared::auth::password::{hash_password, verify_password};
/// use tabkeeper_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(1), "secret-key")?;
/// assert_eq!(validate_token(&token, "secret-key")?.sub, 1);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
