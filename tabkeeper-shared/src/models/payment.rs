/// Payment model
///
/// Money received against a ticket. The timestamp column is `created_at_time` but it is
/// exposed as `created_at` in JSON.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     payment_id BIGSERIAL PRIMARY KEY,
///     ticket_id BIGINT NOT NULL,
///     created_at_time TIMESTAMPTZ NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     method TEXT NOT NULL
/// );
/// ```

use super::{Entity, EntityError, TicketChild, Timestamped};
use crate::query::SqlValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Accepted payment methods
pub const PAYMENT_METHODS: [&str; 4] = ["Credit Card", "PayPal", "Bitcoin", "Bank Transfer"];

/// Payment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, sqlx::FromRow)]
pub struct Payment {
    pub payment_id: i64,

    pub ticket_id: i64,

    #[serde(rename = "created_at")]
    pub created_at_time: DateTime<Utc>,

    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,

    #[validate(custom(function = "validate_method"))]
    pub method: String,
}

/// Input for creating a new payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePayment {
    #[validate(range(min = 1, message = "ticket_id must be a positive id"))]
    pub ticket_id: i64,

    /// Defaults to now
    #[serde(rename = "created_at")]
    pub created_at_time: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: f64,

    #[validate(custom(function = "validate_method"))]
    pub method: String,
}

/// Input for updating an existing payment
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePayment {
    #[validate(range(min = 1, message = "ticket_id must be a positive id"))]
    pub ticket_id: Option<i64>,

    #[serde(rename = "created_at")]
    pub created_at_time: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    pub amount: Option<f64>,

    #[validate(custom(function = "validate_method"))]
    pub method: Option<String>,
}

fn validate_method(method: &str) -> Result<(), ValidationError> {
    if PAYMENT_METHODS.contains(&method) {
        return Ok(());
    }

    let mut error = ValidationError::new("method");
    error.message = Some(format!("method must be one of: {}", PAYMENT_METHODS.join(", ")).into());
    Err(error)
}

impl Entity for Payment {
    const TABLE: &'static str = "payments";
    const ID_COLUMN: &'static str = "payment_id";
    const LABEL: &'static str = "payment";

    type Draft = CreatePayment;
    type Patch = UpdatePayment;

    fn id(&self) -> i64 {
        self.payment_id
    }

    fn set_id(&mut self, id: i64) {
        self.payment_id = id;
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("ticket_id", SqlValue::Int(self.ticket_id)),
            ("created_at_time", SqlValue::Timestamp(self.created_at_time)),
            ("amount", SqlValue::Float(self.amount)),
            ("method", SqlValue::from(self.method.as_str())),
        ]
    }

    fn from_draft(draft: CreatePayment) -> Result<Self, EntityError> {
        draft.validate()?;

        Ok(Self {
            payment_id: 0,
            ticket_id: draft.ticket_id,
            created_at_time: draft.created_at_time.unwrap_or_else(Utc::now),
            amount: draft.amount,
            method: draft.method,
        })
    }

    fn apply(&mut self, patch: UpdatePayment) -> Result<(), EntityError> {
        patch.validate()?;

        if let Some(ticket_id) = patch.ticket_id {
            self.ticket_id = ticket_id;
        }
        if let Some(created_at_time) = patch.created_at_time {
            self.created_at_time = created_at_time;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }

        Ok(())
    }
}

impl Timestamped for Payment {
    const CREATED_COLUMN: &'static str = "created_at_time";

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at_time
    }
}

impl TicketChild for Payment {
    const TICKET_COLUMN: &'static str = "ticket_id";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_must_be_known() {
        for method in PAYMENT_METHODS {
            assert!(validate_method(method).is_ok());
        }
        assert!(validate_method("Cash").is_err());
        assert!(validate_method("paypal").is_err());
    }

    #[test]
    fn test_draft_from_json_uses_created_at() {
        let draft: CreatePayment = serde_json::from_str(
            r#"{"ticket_id": 4, "created_at": "2024-03-01T10:00:00Z", "amount": 12.5, "method": "PayPal"}"#,
        )
        .unwrap();

        let payment = Payment::from_draft(draft).unwrap();
        let json = serde_json::to_value(&payment).unwrap();

        assert_eq!(json["created_at"], "2024-03-01T10:00:00Z");
        assert!(json.get("created_at_time").is_none());
    }

    #[test]
    fn test_unknown_method_rejected_on_create() {
        let draft = CreatePayment {
            ticket_id: 1,
            created_at_time: None,
            amount: 1.0,
            method: "Cash".to_string(),
        };

        assert!(matches!(Payment::from_draft(draft), Err(EntityError::Invalid(_))));
    }
}
