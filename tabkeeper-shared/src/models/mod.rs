/// Database models for tabkeeper
///
/// Every record type implements [`Entity`], a descriptor that lets one generic
/// implementation of list/create/get/update/delete and of the range filters serve all four
/// tables instead of four hand-copied ones.
///
/// # Models
///
/// - `user`: people who own tickets
/// - `ticket`: a tab opened by a user, optionally paid
/// - `order`: a line item on a ticket
/// - `payment`: money received against a ticket
///
/// # Example
///
/// ```no_run
/// use tabkeeper_shared::models::{Entity, user::{CreateUser, User}};
/// use tabkeeper_shared::store::{postgres::PgStore, Store};
/// use chrono::NaiveDate;
///
/// # async fn example(store: PgStore) -> Result<(), Box<dyn std::error::Error>> {
/// let draft = CreateUser {
///     name: "Ada".to_string(),
///     dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
///     email: "ada@example.com".to_string(),
///     password: "correct horse".to_string(),
/// };
///
/// let user = store.insert(User::from_draft(draft)?).await?;
/// println!("Created user {}", user.id());
/// # Ok(())
/// # }
/// ```

pub mod order;
pub mod payment;
pub mod ticket;
pub mod user;

use crate::{auth::password::PasswordError, query::SqlValue};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::PgRow;
use validator::Validate;

pub use order::Order;
pub use payment::Payment;
pub use ticket::Ticket;
pub use user::User;

/// Error type for turning payloads into records
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// Payload failed field validation
    #[error("Validation failed: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// Password could not be hashed
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Descriptor for a storable record type
///
/// Implementors supply the table layout (constants), a uniform identity view, the
/// non-identity columns as typed values, and the create/update payload types.
pub trait Entity:
    Serialize
    + for<'r> sqlx::FromRow<'r, PgRow>
    + Validate
    + Clone
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Table name
    const TABLE: &'static str;

    /// Primary key column
    const ID_COLUMN: &'static str;

    /// Lowercase singular label for messages ("user", "ticket", ...)
    const LABEL: &'static str;

    /// Columns whose values must be unique across the table
    const UNIQUE_COLUMNS: &'static [&'static str] = &[];

    /// Create payload
    type Draft: DeserializeOwned + Validate + Send;

    /// Partial update payload; absent fields keep their value
    type Patch: DeserializeOwned + Validate + Send;

    /// Primary key (0 before the record is stored)
    fn id(&self) -> i64;

    /// Assigns the primary key; used by stores that generate ids themselves
    fn set_id(&mut self, id: i64);

    /// Non-identity columns in table order
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;

    /// Builds an unsaved record from a create payload
    fn from_draft(draft: Self::Draft) -> Result<Self, EntityError>;

    /// Merges a partial update into the record
    fn apply(&mut self, patch: Self::Patch) -> Result<(), EntityError>;

    /// Value of any column, identity included
    fn value_of(&self, column: &str) -> Option<SqlValue> {
        if column == Self::ID_COLUMN {
            return Some(SqlValue::Int(self.id()));
        }

        self.columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

/// Records carrying a creation timestamp
///
/// Enables the generic creation-date range filter.
pub trait Timestamped: Entity {
    /// Creation timestamp column
    const CREATED_COLUMN: &'static str;

    /// Creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}

/// Accessors the records join needs from a ticket type
///
/// Keeps the join free of concrete field names.
pub trait TicketLike: Timestamped {
    /// Owning user id
    fn user_id(&self) -> i64;

    /// The ticket's own id
    fn ticket_id(&self) -> i64 {
        self.id()
    }
}

/// Column holding the parent ticket id for orders and payments
pub trait TicketChild: Entity {
    /// Foreign key column name
    const TICKET_COLUMN: &'static str;
}
