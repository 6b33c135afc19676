/// User model
///
/// Users own tickets. Passwords are stored as Argon2id hashes and are never serialized
/// back out of the API.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     dob DATE NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL
/// );
/// ```

use super::{Entity, EntityError};
use crate::{
    auth::password::hash_password,
    query::{Condition, Filter, SqlValue},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User model representing a person who can open tickets
#[derive(Debug, Clone, PartialEq, Serialize, Validate, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Display name (not unique)
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,

    /// Date of birth
    pub dob: NaiveDate,

    /// Email address, unique across all users
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Input for creating a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,

    pub dob: NaiveDate,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password; hashed before it reaches storage
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Input for updating an existing user
///
/// All fields are optional. Only present fields are changed.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    pub dob: Option<NaiveDate>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,
}

impl User {
    /// Filter matching the user with this email address
    pub fn by_email(email: &str) -> Filter {
        Filter::new().and(Condition::Eq("email", SqlValue::from(email)))
    }

    /// Filter matching users with exactly this name
    pub fn by_name(name: &str) -> Filter {
        Filter::new().and(Condition::Eq("name", SqlValue::from(name)))
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const ID_COLUMN: &'static str = "id";
    const LABEL: &'static str = "user";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["email"];

    type Draft = CreateUser;
    type Patch = UpdateUser;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", SqlValue::from(self.name.as_str())),
            ("dob", SqlValue::Date(self.dob)),
            ("email", SqlValue::from(self.email.as_str())),
            ("password_hash", SqlValue::from(self.password_hash.as_str())),
        ]
    }

    fn from_draft(draft: CreateUser) -> Result<Self, EntityError> {
        draft.validate()?;

        Ok(Self {
            id: 0,
            name: draft.name,
            dob: draft.dob,
            email: draft.email,
            password_hash: hash_password(&draft.password)?,
        })
    }

    fn apply(&mut self, patch: UpdateUser) -> Result<(), EntityError> {
        patch.validate()?;

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(dob) = patch.dob {
            self.dob = dob;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password_hash = hash_password(&password)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    fn draft() -> CreateUser {
        CreateUser {
            name: "A".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            email: "a@x.com".to_string(),
            password: "p".to_string(),
        }
    }

    #[test]
    fn test_from_draft_hashes_password() {
        let user = User::from_draft(draft()).unwrap();

        assert_eq!(user.id, 0);
        assert_ne!(user.password_hash, "p");
        assert!(verify_password("p", &user.password_hash).unwrap());
    }

    #[test]
    fn test_from_draft_rejects_bad_email() {
        let mut bad = draft();
        bad.email = "not-an-email".to_string();

        assert!(matches!(User::from_draft(bad), Err(EntityError::Invalid(_))));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::from_draft(draft()).unwrap();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["dob"], "1990-01-01");
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut user = User::from_draft(draft()).unwrap();
        let before_hash = user.password_hash.clone();

        user.apply(UpdateUser {
            name: Some("B".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(user.name, "B");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.password_hash, before_hash);
    }

    #[test]
    fn test_value_of_includes_identity() {
        let mut user = User::from_draft(draft()).unwrap();
        user.set_id(7);

        assert_eq!(user.value_of("id"), Some(SqlValue::Int(7)));
        assert_eq!(user.value_of("name"), Some(SqlValue::from("A")));
        assert_eq!(user.value_of("missing"), None);
    }
}
