/// Storage backends
///
/// [`Store`] is the one seam between handlers and persistence. It is generic over the
/// record type, so a single implementation of select/insert/update/delete serves every
/// [`Entity`]. Two backends exist:
///
/// - [`postgres::PgStore`]: renders [`Filter`]s to parameterized SQL over a `PgPool`
/// - [`memory::MemoryStore`]: evaluates the same filters over in-process rows; used by tests
///
/// The store handle is constructed once at startup and injected into the application
/// state.
///
/// # Example
///
/// ```
/// use tabkeeper_shared::models::{Entity, ticket::{CreateTicket, Ticket}};
/// use tabkeeper_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let draft = CreateTicket { user_id: 1, date_created: None, date_paid: None };
///
/// let ticket = store.insert(Ticket::from_draft(draft)?).await?;
/// let found: Option<Ticket> = store.find(ticket.id()).await?;
/// assert_eq!(found, Some(ticket));
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use crate::{models::Entity, query::Filter};
use async_trait::async_trait;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed (connection, syntax, decoding, ...)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write
    #[error("Duplicate value violates unique constraint '{constraint}' on {table}")]
    UniqueViolation {
        table: &'static str,
        constraint: String,
    },

    /// A check constraint rejected the write
    #[error("Value violates check constraint '{constraint}' on {table}")]
    CheckViolation {
        table: &'static str,
        constraint: String,
    },
}

impl StoreError {
    /// Classifies a sqlx error raised while writing to `table`
    pub fn from_write(table: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { table, constraint };
            }
            if db_err.is_check_violation() {
                return StoreError::CheckViolation { table, constraint };
            }
        }

        StoreError::Database(err)
    }
}

/// Generic record storage
///
/// Every method is generic over the record type; results of `select` are ordered by the
/// identity column.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// Records matching every condition of `filter`
    async fn select<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, StoreError>;

    /// Persists a new record and returns it with its generated id
    async fn insert<E: Entity>(&self, record: E) -> Result<E, StoreError>;

    /// Overwrites the stored record with the same id
    ///
    /// Returns `None` when no such record exists.
    async fn update<E: Entity>(&self, record: E) -> Result<Option<E>, StoreError>;

    /// Removes a record by id; `false` when nothing was removed
    async fn delete<E: Entity>(&self, id: i64) -> Result<bool, StoreError>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Every record of a type
    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        self.select(&Filter::new()).await
    }

    /// One record by id
    async fn find<E: Entity>(&self, id: i64) -> Result<Option<E>, StoreError> {
        let mut found = self.select::<E>(&Filter::by_id(E::ID_COLUMN, id)).await?;
        Ok(found.pop())
    }
}
