/// Date and time-window parsing
///
/// Path parameters arrive as strings. Everything here parses them strictly and reports a
/// [`WindowError`] instead of falling back to a zero time, so a typo in a URL is a 400 rather
/// than a silently empty (or silently huge) result.
///
/// All times are interpreted in UTC.
///
/// # Formats
///
/// - date: `YYYY-MM-DD`
/// - time of day: `HH:MM:SS`
/// - date-time: `YYYY-MM-DD HH:MM:SS`

use super::{Condition, Filter, SqlValue};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Date format accepted in paths
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format accepted in paths
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Date-time format accepted in paths
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for window parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("Invalid date format '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time format '{0}'. Use HH:MM:SS")]
    InvalidTime(String),

    #[error("Invalid date-time format '{0}'. Use YYYY-MM-DD HH:MM:SS")]
    InvalidDateTime(String),
}

/// Parses a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| WindowError::InvalidDate(input.to_string()))
}

/// Parses a `HH:MM:SS` time of day
pub fn parse_time(input: &str) -> Result<NaiveTime, WindowError> {
    NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
        .map_err(|_| WindowError::InvalidTime(input.to_string()))
}

/// Parses a `YYYY-MM-DD HH:MM:SS` date-time as UTC
pub fn parse_date_time(input: &str) -> Result<DateTime<Utc>, WindowError> {
    NaiveDateTime::parse_from_str(input.trim(), DATE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| WindowError::InvalidDateTime(input.to_string()))
}

/// Start of a calendar day in UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Builds the conditions for "column falls on any day from `start` through `end`"
///
/// Both days are included in full: the upper bound is the start of the day after `end`,
/// exclusive.
pub fn date_range(column: &'static str, start: NaiveDate, end: NaiveDate) -> Filter {
    let filter = Filter::new().and(Condition::Gte(column, SqlValue::Timestamp(start_of_day(start))));

    match end.checked_add_days(Days::new(1)) {
        Some(next) => filter.and(Condition::Lt(column, SqlValue::Timestamp(start_of_day(next)))),
        None => filter,
    }
}

/// Builds the conditions for an inclusive `[start, end]` timestamp range
pub fn timestamp_range(column: &'static str, start: DateTime<Utc>, end: DateTime<Utc>) -> Filter {
    Filter::new()
        .and(Condition::Gte(column, SqlValue::Timestamp(start)))
        .and(Condition::Lte(column, SqlValue::Timestamp(end)))
}

/// A ticket-creation window for the records join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Every instant of one UTC calendar day
    Day(NaiveDate),

    /// One UTC calendar day between two times of day, both inclusive
    DayTime {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
}

impl Window {
    /// Parses a day-only window from a `YYYY-MM-DD` path segment
    pub fn day(date: &str) -> Result<Self, WindowError> {
        Ok(Window::Day(parse_date(date)?))
    }

    /// Parses a day plus start/end time-of-day window
    pub fn day_time(date: &str, start: &str, end: &str) -> Result<Self, WindowError> {
        Ok(Window::DayTime {
            date: parse_date(date)?,
            start: parse_time(start)?,
            end: parse_time(end)?,
        })
    }

    /// Inclusive UTC bounds of the window
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            Window::Day(date) => {
                let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
                (start_of_day(date), date.and_time(last).and_utc())
            }
            Window::DayTime { date, start, end } => {
                (date.and_time(start).and_utc(), date.and_time(end).and_utc())
            }
        }
    }

    /// Filter selecting rows whose `column` falls inside the window
    ///
    /// A day window compares on the date-truncated timestamp so fractional seconds after
    /// 23:59:59 are still included.
    pub fn filter(&self, column: &'static str) -> Filter {
        match *self {
            Window::Day(date) => Filter::new().and(Condition::OnDate(column, date)),
            Window::DayTime { .. } => {
                let (start, end) = self.bounds();
                timestamp_range(column, start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(matches!(parse_date("2024-13-01"), Err(WindowError::InvalidDate(_))));
        assert!(matches!(parse_date("01/03/2024"), Err(WindowError::InvalidDate(_))));
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("10:30:00").unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap()
        );
        assert!(matches!(parse_time("25:00:00"), Err(WindowError::InvalidTime(_))));
        assert!(parse_time("10:30").is_err());
    }

    #[test]
    fn test_parse_date_time() {
        assert_eq!(
            parse_date_time("2024-03-01 10:00:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_date_time("2024-03-01"),
            Err(WindowError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn test_window_bounds() {
        let day = Window::day("2024-03-01").unwrap();
        let (start, end) = day.bounds();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap());

        let span = Window::day_time("2024-03-01", "09:00:00", "11:30:00").unwrap();
        let (start, end) = span.bounds();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap());
    }

    #[test]
    fn test_window_rejects_bad_parts() {
        assert!(Window::day("yesterday").is_err());
        assert!(matches!(
            Window::day_time("2024-03-01", "nine", "11:00:00"),
            Err(WindowError::InvalidTime(_))
        ));
        assert!(matches!(
            Window::day_time("2024-03-01", "09:00:00", "11:00"),
            Err(WindowError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_date_range_includes_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let filter = date_range("date_created", start, end);

        let at = |d: u32, h: u32, m: u32| {
            let value = SqlValue::Timestamp(Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap());
            move |_: &str| Some(value.clone())
        };

        assert!(filter.matches(at(1, 0, 0)));
        assert!(filter.matches(at(2, 23, 59)));
        assert!(!filter.matches(at(3, 0, 0)));
    }
}
