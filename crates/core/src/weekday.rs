use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

use crate::types::WeekdayLookup;

/// Date pattern accepted by the lookup path: two-digit day, two-digit month,
/// four-digit year, `-`-separated.
pub const DATE_PATTERN: &str = "%d-%m-%Y";

/// Error raised when a lookup date string cannot be parsed.
#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("'{value}' is not a valid dd-MM-yyyy date: {source}")]
    Invalid {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("'{value}' does not match the dd-MM-yyyy pattern")]
    Nonconforming { value: String },
}

/// Parses `value` against [`DATE_PATTERN`] and derives its weekday name.
///
/// The original string is preserved in the result; only the weekday is
/// computed. Invalid calendar dates (e.g. `31-02-2025`) fail the same way as
/// malformed strings.
pub fn lookup(value: &str) -> Result<WeekdayLookup, DateParseError> {
    let date =
        NaiveDate::parse_from_str(value, DATE_PATTERN).map_err(|source| DateParseError::Invalid {
            value: value.to_string(),
            source,
        })?;

    // chrono accepts single-digit day and month for %d-%m; only the two-digit
    // form is valid here, so the parsed date must render back to the input.
    if date.format(DATE_PATTERN).to_string() != value {
        return Err(DateParseError::Nonconforming {
            value: value.to_string(),
        });
    }

    Ok(WeekdayLookup {
        date: value.to_string(),
        day_of_week: weekday_name(date.weekday()).to_string(),
    })
}

/// Returns the canonical upper-case name for a weekday.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}
