/// In-memory storage backend
///
/// Keeps rows of every entity type in one map keyed by table name. Ids are assigned per
/// table starting at 1, unique columns are enforced, and every data operation bumps a call
/// counter so tests can assert that a request never reached storage.

use super::{Store, StoreError};
use crate::{models::Entity, query::Filter};
use async_trait::async_trait;
use std::{
    any::Any,
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Box<dyn Any + Send + Sync>>,
}

impl Table {
    fn records<E: Entity>(&self) -> impl Iterator<Item = &E> + '_ {
        self.rows.iter().filter_map(|row| row.downcast_ref::<E>())
    }

    fn position<E: Entity>(&self, id: i64) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.downcast_ref::<E>().is_some_and(|r| r.id() == id))
    }

    /// First unique column on which `candidate` clashes with another row
    fn clash<E: Entity>(&self, candidate: &E) -> Option<&'static str> {
        E::UNIQUE_COLUMNS.iter().copied().find(|column| {
            let value = candidate.value_of(column);
            self.records::<E>()
                .any(|other| other.id() != candidate.id() && other.value_of(column) == value)
        })
    }
}

fn unique_violation<E: Entity>(column: &str) -> StoreError {
    StoreError::UniqueViolation {
        table: E::TABLE,
        constraint: format!("{}_{}_key", E::TABLE, column),
    }
}

/// Store holding records in process memory
///
/// Cloning shares the underlying tables and call counter.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<&'static str, Table>>>,
    calls: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of select/insert/update/delete calls made so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
        self.record_call();
        let tables = self.tables.lock().await;

        let mut records: Vec<E> = tables
            .get(E::TABLE)
            .map(|table| {
                table
                    .records::<E>()
                    .filter(|record| filter.matches(|column| record.value_of(column)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|record| record.id());

        debug!(table = E::TABLE, matched = records.len(), "Selected records");
        Ok(records)
    }

    async fn insert<E: Entity>(&self, mut record: E) -> Result<E, StoreError> {
        self.record_call();
        let mut tables = self.tables.lock().await;
        let table = tables.entry(E::TABLE).or_default();

        record.set_id(table.next_id + 1);
        if let Some(column) = table.clash(&record) {
            return Err(unique_violation::<E>(column));
        }

        table.next_id += 1;
        table.rows.push(Box::new(record.clone()));

        debug!(table = E::TABLE, id = record.id(), "Inserted record");
        Ok(record)
    }

    async fn update<E: Entity>(&self, record: E) -> Result<Option<E>, StoreError> {
        self.record_call();
        let mut tables = self.tables.lock().await;
        let Some(table) = tables.get_mut(E::TABLE) else {
            return Ok(None);
        };
        let Some(index) = table.position::<E>(record.id()) else {
            return Ok(None);
        };
        if let Some(column) = table.clash(&record) {
            return Err(unique_violation::<E>(column));
        }

        table.rows[index] = Box::new(record.clone());

        debug!(table = E::TABLE, id = record.id(), "Updated record");
        Ok(Some(record))
    }

    async fn delete<E: Entity>(&self, id: i64) -> Result<bool, StoreError> {
        self.record_call();
        let mut tables = self.tables.lock().await;

        let removed = match tables.get_mut(E::TABLE) {
            Some(table) => match table.position::<E>(id) {
                Some(index) => {
                    table.rows.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };

        debug!(table = E::TABLE, id, removed, "Deleted record");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
