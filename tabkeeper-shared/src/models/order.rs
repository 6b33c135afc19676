/// Order model
///
/// An order is one line on a ticket: a menu item, a quantity and a unit price.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     order_id BIGSERIAL PRIMARY KEY,
///     ticket_id BIGINT NOT NULL,
///     created_at_time TIMESTAMPTZ NOT NULL,
///     menu_item TEXT NOT NULL,
///     quantity INTEGER NOT NULL CHECK (quantity >= 1),
///     price DOUBLE PRECISION NOT NULL CHECK (price >= 0)
/// );
/// ```

use super::{Entity, EntityError, TicketChild, Timestamped};
use crate::query::SqlValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, sqlx::FromRow)]
pub struct Order {
    pub order_id: i64,

    pub ticket_id: i64,

    pub created_at_time: DateTime<Utc>,

    #[validate(length(min = 1, message = "menu_item must not be empty"))]
    pub menu_item: String,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

/// Input for creating a new order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrder {
    #[validate(range(min = 1, message = "ticket_id must be a positive id"))]
    pub ticket_id: i64,

    /// Defaults to now
    pub created_at_time: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "menu_item must not be empty"))]
    pub menu_item: String,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

/// Input for updating an existing order
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrder {
    #[validate(range(min = 1, message = "ticket_id must be a positive id"))]
    pub ticket_id: Option<i64>,

    pub created_at_time: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "menu_item must not be empty"))]
    pub menu_item: Option<String>,

    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,

    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
}

impl Order {
    /// Line total
    pub fn total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

impl Entity for Order {
    const TABLE: &'static str = "orders";
    const ID_COLUMN: &'static str = "order_id";
    const LABEL: &'static str = "order";

    type Draft = CreateOrder;
    type Patch = UpdateOrder;

    fn id(&self) -> i64 {
        self.order_id
    }

    fn set_id(&mut self, id: i64) {
        self.order_id = id;
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("ticket_id", SqlValue::Int(self.ticket_id)),
            ("created_at_time", SqlValue::Timestamp(self.created_at_time)),
            ("menu_item", SqlValue::from(self.menu_item.as_str())),
            ("quantity", SqlValue::from(self.quantity)),
            ("price", SqlValue::Float(self.price)),
        ]
    }

    fn from_draft(draft: CreateOrder) -> Result<Self, EntityError> {
        draft.validate()?;

        Ok(Self {
            order_id: 0,
            ticket_id: draft.ticket_id,
            created_at_time: draft.created_at_time.unwrap_or_else(Utc::now),
            menu_item: draft.menu_item,
            quantity: draft.quantity,
            price: draft.price,
        })
    }

    fn apply(&mut self, patch: UpdateOrder) -> Result<(), EntityError> {
        patch.validate()?;

        if let Some(ticket_id) = patch.ticket_id {
            self.ticket_id = ticket_id;
        }
        if let Some(created_at_time) = patch.created_at_time {
            self.created_at_time = created_at_time;
        }
        if let Some(menu_item) = patch.menu_item {
            self.menu_item = menu_item;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }

        Ok(())
    }
}

impl Timestamped for Order {
    const CREATED_COLUMN: &'static str = "created_at_time";

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at_time
    }
}

impl TicketChild for Order {
    const TICKET_COLUMN: &'static str = "ticket_id";
}
