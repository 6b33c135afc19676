/// Records join
///
/// Assembles everything that happened on the tickets opened inside a [`Window`]: the tickets
/// themselves, the users who own them, and their orders and payments.
///
/// 1. Tickets are selected by creation time.
/// 2. Owner ids and ticket ids are collected into sets (each id queried once).
/// 3. Users, orders and payments are fetched with `= ANY(ids)` lookups, concurrently.
///
/// No tickets means no fan-out queries. The first failing query fails the whole join.
///
/// # Example
///
/// ```
/// use tabkeeper_shared::query::Window;
/// use tabkeeper_shared::records::fetch_records;
/// use tabkeeper_shared::models::{Order, Payment, Ticket, User};
/// use tabkeeper_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let window = Window::day("2024-03-01")?;
///
/// let records = fetch_records::<_, User, Ticket, Order, Payment>(&store, &window).await?;
/// assert!(records.is_empty());
/// # Ok(())
/// # }
/// ```

use crate::{
    models::{Entity, TicketChild, TicketLike},
    query::{Condition, Filter, Window},
    store::{Store, StoreError},
};
use serde::Serialize;
use std::{collections::BTreeSet, time::Instant};
use tracing::info;

/// Result of a records join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Records<U, T, O, P> {
    pub users: Vec<U>,
    pub tickets: Vec<T>,
    pub orders: Vec<O>,
    pub payments: Vec<P>,
}

impl<U, T, O, P> Records<U, T, O, P> {
    /// A join over no tickets
    pub fn empty() -> Self {
        Self {
            users: Vec::new(),
            tickets: Vec::new(),
            orders: Vec::new(),
            payments: Vec::new(),
        }
    }

    /// Whether no ticket matched the window
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

fn any_of(column: &'static str, ids: &BTreeSet<i64>) -> Filter {
    Filter::new().and(Condition::AnyOf(column, ids.iter().copied().collect()))
}

/// Runs the records join for one window
///
/// # Errors
///
/// Returns the first `StoreError` raised by any of the queries
pub async fn fetch_records<S, U, T, O, P>(
    store: &S,
    window: &Window,
) -> Result<Records<U, T, O, P>, StoreError>
where
    S: Store,
    U: Entity,
    T: TicketLike,
    O: TicketChild,
    P: TicketChild,
{
    let started = Instant::now();

    let tickets: Vec<T> = store.select(&window.filter(T::CREATED_COLUMN)).await?;
    if tickets.is_empty() {
        info!(window = ?window, elapsed_ms = started.elapsed().as_millis() as u64, "Records join matched no tickets");
        return Ok(Records::empty());
    }

    let user_ids: BTreeSet<i64> = tickets.iter().map(|t| t.user_id()).collect();
    let ticket_ids: BTreeSet<i64> = tickets.iter().map(|t| t.ticket_id()).collect();

    let users_filter = any_of(U::ID_COLUMN, &user_ids);
    let orders_filter = any_of(O::TICKET_COLUMN, &ticket_ids);
    let payments_filter = any_of(P::TICKET_COLUMN, &ticket_ids);

    let (users, orders, payments) = tokio::try_join!(
        store.select::<U>(&users_filter),
        store.select::<O>(&orders_filter),
        store.select::<P>(&payments_filter),
    )?;

    info!(
        window = ?window,
        tickets = tickets.len(),
        users = users.len(),
        orders = orders.len(),
        payments = payments.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Records join completed"
    );

    Ok(Records {
        users,
        tickets,
        orders,
        payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, Payment, Ticket, User};
    use crate::store::memory::MemoryStore;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    type Joined = Records<User, Ticket, Order, Payment>;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .insert(User {
                id: 0,
                name: "Guest".to_string(),
                dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_ticket(store: &MemoryStore, user_id: i64, created: DateTime<Utc>) -> Ticket {
        store
            .insert(Ticket {
                ticket_id: 0,
                user_id,
                date_created: created,
                date_paid: None,
            })
            .await
            .unwrap()
    }

    async fn seed_order(store: &MemoryStore, ticket_id: i64) -> Order {
        store
            .insert(Order {
                order_id: 0,
                ticket_id,
                created_at_time: at(1, 12),
                menu_item: "Lager".to_string(),
                quantity: 1,
                price: 4.0,
            })
            .await
            .unwrap()
    }

    async fn seed_payment(store: &MemoryStore, ticket_id: i64) -> Payment {
        store
            .insert(Payment {
                payment_id: 0,
                ticket_id,
                created_at_time: at(1, 13),
                amount: 4.0,
                method: "PayPal".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_day_window_joins_related_rows() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice@x.com").await;
        let bob = seed_user(&store, "bob@x.com").await;
        let _carol = seed_user(&store, "carol@x.com").await;

        // Two tickets for alice and one for bob on the 1st; one for bob on the 2nd
        let t1 = seed_ticket(&store, alice.id, at(1, 9)).await;
        let t2 = seed_ticket(&store, alice.id, at(1, 20)).await;
        let t3 = seed_ticket(&store, bob.id, at(1, 23)).await;
        let t4 = seed_ticket(&store, bob.id, at(2, 0)).await;

        seed_order(&store, t1.ticket_id).await;
        seed_order(&store, t3.ticket_id).await;
        seed_order(&store, t4.ticket_id).await;
        seed_payment(&store, t2.ticket_id).await;
        seed_payment(&store, t4.ticket_id).await;

        let window = Window::day("2024-03-01").unwrap();
        let records: Joined = fetch_records(&store, &window).await.unwrap();

        let ticket_ids: Vec<i64> = records.tickets.iter().map(|t| t.ticket_id).collect();
        assert_eq!(ticket_ids, vec![t1.ticket_id, t2.ticket_id, t3.ticket_id]);

        // Each owner appears once even with several tickets
        let user_ids: Vec<i64> = records.users.iter().map(|u| u.id).collect();
        assert_eq!(user_ids, vec![alice.id, bob.id]);

        assert_eq!(records.orders.len(), 2);
        assert_eq!(records.payments.len(), 1);
        for order in &records.orders {
            assert!(ticket_ids.contains(&order.ticket_id));
        }
        for payment in &records.payments {
            assert!(ticket_ids.contains(&payment.ticket_id));
        }
    }

    #[tokio::test]
    async fn test_day_time_window_is_inclusive() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;

        let early = seed_ticket(&store, user.id, at(1, 8)).await;
        let start = seed_ticket(&store, user.id, at(1, 9)).await;
        let end = seed_ticket(&store, user.id, at(1, 11)).await;
        let late = seed_ticket(&store, user.id, at(1, 12)).await;

        let window = Window::day_time("2024-03-01", "09:00:00", "11:00:00").unwrap();
        let records: Joined = fetch_records(&store, &window).await.unwrap();

        let ids: Vec<i64> = records.tickets.iter().map(|t| t.ticket_id).collect();
        assert_eq!(ids, vec![start.ticket_id, end.ticket_id]);
        assert!(!ids.contains(&early.ticket_id));
        assert!(!ids.contains(&late.ticket_id));
    }

    #[tokio::test]
    async fn test_empty_window_skips_fan_out() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;
        seed_ticket(&store, user.id, at(1, 10)).await;

        let calls_before = store.calls();
        let window = Window::day("2024-03-05").unwrap();
        let records: Joined = fetch_records(&store, &window).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(records, Records::empty());
        assert_eq!(store.calls() - calls_before, 1);
    }

    /// Delegates to a memory store but fails every order lookup
    #[derive(Clone, Default)]
    struct BrokenOrders(MemoryStore);

    #[async_trait::async_trait]
    impl Store for BrokenOrders {
        async fn select<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
            if E::TABLE == Order::TABLE {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            self.0.select(filter).await
        }

        async fn insert<E: Entity>(&self, record: E) -> Result<E, StoreError> {
            self.0.insert(record).await
        }

        async fn update<E: Entity>(&self, record: E) -> Result<Option<E>, StoreError> {
            self.0.update(record).await
        }

        async fn delete<E: Entity>(&self, id: i64) -> Result<bool, StoreError> {
            self.0.delete::<E>(id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.0.ping().await
        }
    }

    #[tokio::test]
    async fn test_failing_fan_out_aborts_join() {
        let store = BrokenOrders::default();
        let user = seed_user(&store.0, "a@x.com").await;
        let ticket = seed_ticket(&store.0, user.id, at(1, 10)).await;
        seed_payment(&store.0, ticket.ticket_id).await;

        let window = Window::day("2024-03-01").unwrap();
        let result: Result<Joined, StoreError> = fetch_records(&store, &window).await;

        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_failing_fan_out_is_not_reached_for_empty_window() {
        let store = BrokenOrders::default();
        let user = seed_user(&store.0, "a@x.com").await;
        seed_ticket(&store.0, user.id, at(1, 10)).await;

        let window = Window::day("2024-03-09").unwrap();
        let records: Joined = fetch_records(&store, &window).await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_orphaned_ticket_owner_is_tolerated() {
        let store = MemoryStore::new();
        let ticket = seed_ticket(&store, 99, at(1, 10)).await;

        let window = Window::day("2024-03-01").unwrap();
        let records: Joined = fetch_records(&store, &window).await.unwrap();

        assert_eq!(records.tickets, vec![ticket]);
        assert!(records.users.is_empty());
    }
}
