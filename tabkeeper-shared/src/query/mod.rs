/// Backend-neutral query filters
///
/// A [`Filter`] is a conjunction of typed [`Condition`]s over entity columns. The same filter
/// is rendered to parameterized SQL by the PostgreSQL store and evaluated directly by the
/// in-memory store, so handlers describe *what* they want once.
///
/// Column names are always `&'static str` taken from an entity descriptor, never from
/// request input, so they can be spliced into SQL text safely. Values are always bound.
///
/// # Example
///
/// ```
/// use tabkeeper_shared::query::{Condition, Filter, SqlValue};
///
/// let filter = Filter::new()
///     .and(Condition::Gte("id", SqlValue::Int(10)))
///     .and(Condition::Lte("id", SqlValue::Int(20)));
///
/// assert_eq!(filter.conditions().len(), 2);
/// ```

pub mod window;

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

pub use window::{parse_date, parse_date_time, parse_time, Window, WindowError};

/// A typed column value
///
/// Used both as a filter operand and as the payload of an INSERT/UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// BIGINT / INTEGER
    Int(i64),

    /// DOUBLE PRECISION
    Float(f64),

    /// TEXT
    Text(String),

    /// DATE
    Date(NaiveDate),

    /// TIMESTAMPTZ
    Timestamp(DateTime<Utc>),

    /// A NULL TIMESTAMPTZ (typed so PostgreSQL accepts the bind)
    NullTimestamp,
}

impl SqlValue {
    /// Whether this value represents SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::NullTimestamp)
    }

    /// Compares two values of the same kind
    ///
    /// Returns `None` for mismatched kinds or when either side is NULL, mirroring SQL
    /// semantics where comparisons against NULL are never true.
    pub fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::Int(a), SqlValue::Int(b)) => Some(a.cmp(b)),
            (SqlValue::Float(a), SqlValue::Float(b)) => a.partial_cmp(b),
            (SqlValue::Int(a), SqlValue::Float(b)) => (*a as f64).partial_cmp(b),
            (SqlValue::Float(a), SqlValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (SqlValue::Text(a), SqlValue::Text(b)) => Some(a.cmp(b)),
            (SqlValue::Date(a), SqlValue::Date(b)) => Some(a.cmp(b)),
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<Option<DateTime<Utc>>> for SqlValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(ts) => SqlValue::Timestamp(ts),
            None => SqlValue::NullTimestamp,
        }
    }
}

/// A single predicate over one column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq(&'static str, SqlValue),

    /// `column >= value`
    Gte(&'static str, SqlValue),

    /// `column <= value`
    Lte(&'static str, SqlValue),

    /// `column < value`
    Lt(&'static str, SqlValue),

    /// `column IS NULL`
    IsNull(&'static str),

    /// `column IS NOT NULL`
    IsNotNull(&'static str),

    /// `column = ANY(ids)`; an empty list matches nothing
    AnyOf(&'static str, Vec<i64>),

    /// Timestamp column truncated to a UTC calendar date equals `date`
    OnDate(&'static str, NaiveDate),
}

impl Condition {
    /// Column this condition applies to
    pub fn column(&self) -> &'static str {
        match self {
            Condition::Eq(c, _)
            | Condition::Gte(c, _)
            | Condition::Lte(c, _)
            | Condition::Lt(c, _)
            | Condition::IsNull(c)
            | Condition::IsNotNull(c)
            | Condition::AnyOf(c, _)
            | Condition::OnDate(c, _) => c,
        }
    }

    /// Evaluates the condition against a column value
    ///
    /// `value` is `None` when the record has no such column, which never matches.
    pub fn matches(&self, value: Option<&SqlValue>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Condition::Eq(_, expected) => value.compare(expected) == Some(Ordering::Equal),
            Condition::Gte(_, bound) => matches!(
                value.compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lte(_, bound) => matches!(
                value.compare(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Lt(_, bound) => value.compare(bound) == Some(Ordering::Less),
            Condition::IsNull(_) => value.is_null(),
            Condition::IsNotNull(_) => !value.is_null(),
            Condition::AnyOf(_, ids) => match value {
                SqlValue::Int(id) => ids.contains(id),
                _ => false,
            },
            Condition::OnDate(_, date) => match value {
                SqlValue::Timestamp(ts) => ts.date_naive() == *date,
                _ => false,
            },
        }
    }
}

/// Conjunction of conditions; the empty filter matches every record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the identity column
    pub fn by_id(column: &'static str, id: i64) -> Self {
        Self::new().and(Condition::Eq(column, SqlValue::Int(id)))
    }

    /// Adds a condition
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Conditions in insertion order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether there are no conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter with a column lookup function
    pub fn matches<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<SqlValue>,
    {
        self.conditions
            .iter()
            .all(|condition| condition.matches(lookup(condition.column()).as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_compare_mismatched_kinds() {
        assert_eq!(SqlValue::Int(1).compare(&SqlValue::Text("1".into())), None);
        assert_eq!(SqlValue::NullTimestamp.compare(&SqlValue::NullTimestamp), None);
        assert_eq!(
            SqlValue::Int(2).compare(&SqlValue::Float(1.5)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_range_conditions() {
        let value = SqlValue::Int(5);
        assert!(Condition::Gte("id", SqlValue::Int(5)).matches(Some(&value)));
        assert!(Condition::Lte("id", SqlValue::Int(5)).matches(Some(&value)));
        assert!(!Condition::Lt("id", SqlValue::Int(5)).matches(Some(&value)));
        assert!(!Condition::Gte("id", SqlValue::Int(6)).matches(Some(&value)));
    }

    #[test]
    fn test_null_conditions() {
        let unpaid = SqlValue::NullTimestamp;
        let paid = SqlValue::Timestamp(ts(2024, 3, 1, 10));

        assert!(Condition::IsNull("date_paid").matches(Some(&unpaid)));
        assert!(!Condition::IsNull("date_paid").matches(Some(&paid)));
        assert!(Condition::IsNotNull("date_paid").matches(Some(&paid)));
        assert!(!Condition::IsNotNull("date_paid").matches(Some(&unpaid)));

        // Comparisons against NULL are never true
        assert!(!Condition::Gte("date_paid", SqlValue::Timestamp(ts(2000, 1, 1, 0)))
            .matches(Some(&unpaid)));
    }

    #[test]
    fn test_any_of() {
        let condition = Condition::AnyOf("ticket_id", vec![1, 3]);
        assert!(condition.matches(Some(&SqlValue::Int(3))));
        assert!(!condition.matches(Some(&SqlValue::Int(2))));
        assert!(!Condition::AnyOf("ticket_id", vec![]).matches(Some(&SqlValue::Int(1))));
    }

    #[test]
    fn test_on_date_truncates_to_utc_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let condition = Condition::OnDate("date_created", date);

        assert!(condition.matches(Some(&SqlValue::Timestamp(ts(2024, 3, 1, 0)))));
        assert!(condition.matches(Some(&SqlValue::Timestamp(ts(2024, 3, 1, 23)))));
        assert!(!condition.matches(Some(&SqlValue::Timestamp(ts(2024, 3, 2, 0)))));
    }

    #[test]
    fn test_missing_column_never_matches() {
        assert!(!Condition::IsNull("nope").matches(None));
    }

    #[test]
    fn test_filter_is_conjunction() {
        let filter = Filter::new()
            .and(Condition::Gte("id", SqlValue::Int(2)))
            .and(Condition::Eq("name", SqlValue::from("A")));

        let lookup = |id: i64, name: &'static str| {
            move |column: &str| match column {
                "id" => Some(SqlValue::Int(id)),
                "name" => Some(SqlValue::from(name)),
                _ => None,
            }
        };

        assert!(filter.matches(lookup(2, "A")));
        assert!(!filter.matches(lookup(1, "A")));
        assert!(!filter.matches(lookup(2, "B")));
        assert!(Filter::new().matches(lookup(0, "")));
    }
}
