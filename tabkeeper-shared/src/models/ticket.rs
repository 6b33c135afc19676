/// Ticket model
///
/// A ticket is a tab opened by a user. Orders and payments hang off it. A ticket is
/// *paid* once `date_paid` is set.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tickets (
///     ticket_id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL,
///     date_created TIMESTAMPTZ NOT NULL,
///     date_paid TIMESTAMPTZ,
///     CHECK (date_paid IS NULL OR date_paid >= date_created)
/// );
/// ```

use super::{Entity, EntityError, TicketLike, Timestamped};
use crate::query::{Condition, Filter, SqlValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Ticket model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, sqlx::FromRow)]
#[validate(schema(function = "validate_ticket_dates"))]
pub struct Ticket {
    /// Unique ticket ID
    pub ticket_id: i64,

    /// Owning user
    pub user_id: i64,

    /// When the ticket was opened
    pub date_created: DateTime<Utc>,

    /// When the ticket was settled (None = unpaid)
    pub date_paid: Option<DateTime<Utc>>,
}

/// Input for creating a new ticket
///
/// `date_created` defaults to the current time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTicket {
    #[validate(range(min = 1, message = "user_id must be a positive id"))]
    pub user_id: i64,

    pub date_created: Option<DateTime<Utc>>,

    pub date_paid: Option<DateTime<Utc>>,
}

/// Input for updating an existing ticket
///
/// `date_paid` uses a double option: absent leaves it alone, `null` marks the ticket
/// unpaid again.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTicket {
    #[validate(range(min = 1, message = "user_id must be a positive id"))]
    pub user_id: Option<i64>,

    pub date_created: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    pub date_paid: Option<Option<DateTime<Utc>>>,
}

/// Payment status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// `date_paid` is set
    Paid,

    /// `date_paid` is null
    Unpaid,
}

/// Error for an unknown payment status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status '{0}'. Use 'paid' or 'unpaid'")]
pub struct InvalidPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = InvalidPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            other => Err(InvalidPaymentStatus(other.to_string())),
        }
    }
}

impl PaymentStatus {
    /// Filter selecting tickets in this status
    pub fn filter(self) -> Filter {
        match self {
            PaymentStatus::Paid => Filter::new().and(Condition::IsNotNull("date_paid")),
            PaymentStatus::Unpaid => Filter::new().and(Condition::IsNull("date_paid")),
        }
    }
}

impl Ticket {
    /// Filter matching tickets owned by a user
    pub fn by_user(user_id: i64) -> Filter {
        Filter::new().and(Condition::Eq("user_id", SqlValue::Int(user_id)))
    }

    /// Whether the ticket has been paid
    pub fn is_paid(&self) -> bool {
        self.date_paid.is_some()
    }
}

fn validate_ticket_dates(ticket: &Ticket) -> Result<(), ValidationError> {
    match ticket.date_paid {
        Some(paid) if paid < ticket.date_created => {
            let mut error = ValidationError::new("date_paid");
            error.message = Some("date_paid must not precede date_created".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(Some)
}

impl Entity for Ticket {
    const TABLE: &'static str = "tickets";
    const ID_COLUMN: &'static str = "ticket_id";
    const LABEL: &'static str = "ticket";

    type Draft = CreateTicket;
    type Patch = UpdateTicket;

    fn id(&self) -> i64 {
        self.ticket_id
    }

    fn set_id(&mut self, id: i64) {
        self.ticket_id = id;
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("user_id", SqlValue::Int(self.user_id)),
            ("date_created", SqlValue::Timestamp(self.date_created)),
            ("date_paid", SqlValue::from(self.date_paid)),
        ]
    }

    fn from_draft(draft: CreateTicket) -> Result<Self, EntityError> {
        draft.validate()?;

        let ticket = Self {
            ticket_id: 0,
            user_id: draft.user_id,
            date_created: draft.date_created.unwrap_or_else(Utc::now),
            date_paid: draft.date_paid,
        };
        ticket.validate()?;

        Ok(ticket)
    }

    fn apply(&mut self, patch: UpdateTicket) -> Result<(), EntityError> {
        patch.validate()?;

        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(date_created) = patch.date_created {
            self.date_created = date_created;
        }
        if let Some(date_paid) = patch.date_paid {
            self.date_paid = date_paid;
        }
        self.validate()?;

        Ok(())
    }
}

impl Timestamped for Ticket {
    const CREATED_COLUMN: &'static str = "date_created";

    fn created_at(&self) -> DateTime<Utc> {
        self.date_created
    }
}

impl TicketLike for Ticket {
    fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!("unpaid".parse::<PaymentStatus>(), Ok(PaymentStatus::Unpaid));
        assert!("PAID".parse::<PaymentStatus>().is_err());
        assert!("".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_payment_status_partitions_tickets() {
        let paid = Ticket {
            ticket_id: 1,
            user_id: 1,
            date_created: at(10),
            date_paid: Some(at(11)),
        };
        let unpaid = Ticket {
            date_paid: None,
            ..paid.clone()
        };

        for ticket in [&paid, &unpaid] {
            let in_paid = PaymentStatus::Paid
                .filter()
                .matches(|c| ticket.value_of(c));
            let in_unpaid = PaymentStatus::Unpaid
                .filter()
                .matches(|c| ticket.value_of(c));

            assert_ne!(in_paid, in_unpaid);
            assert_eq!(in_paid, ticket.is_paid());
        }
    }

    #[test]
    fn test_paid_before_created_is_invalid() {
        let draft = CreateTicket {
            user_id: 1,
            date_created: Some(at(10)),
            date_paid: Some(at(9)),
        };

        assert!(matches!(Ticket::from_draft(draft), Err(EntityError::Invalid(_))));
    }

    #[test]
    fn test_draft_defaults_creation_time() {
        let before = Utc::now();
        let ticket = Ticket::from_draft(CreateTicket {
            user_id: 3,
            date_created: None,
            date_paid: None,
        })
        .unwrap();

        assert!(ticket.date_created >= before);
        assert!(!ticket.is_paid());
    }

    #[test]
    fn test_patch_can_clear_date_paid() {
        let mut ticket = Ticket {
            ticket_id: 1,
            user_id: 1,
            date_created: at(10),
            date_paid: Some(at(11)),
        };

        let untouched: UpdateTicket = serde_json::from_str("{}").unwrap();
        ticket.apply(untouched).unwrap();
        assert!(ticket.is_paid());

        let cleared: UpdateTicket = serde_json::from_str(r#"{"date_paid": null}"#).unwrap();
        ticket.apply(cleared).unwrap();
        assert!(!ticket.is_paid());
    }
}
