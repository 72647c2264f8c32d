// Timestamp encoding for historical queries and the date range behind it
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Encode a local date and time as the API's `YYYYMMDDHHMMSS` string.
///
/// Month, day, hour, minute and second are zero-padded to two digits. The
/// year is written as-is, so years below 1000 produce a shorter string.
pub fn encode(date: NaiveDate, time: NaiveTime) -> String {
    format!(
        "{}{:02}{:02}{:02}{:02}{:02}",
        date.year(),
        date.month(),
        date.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid time `{0}`, expected HH:MM or HH:MM:SS")]
    InvalidTime(String),
    #[error("range starts at {from} which is after its end {to}")]
    Inverted {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// 00:00:00 to 23:59:00 of the given day
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            from: day.and_time(start_of_day()),
            to: day.and_time(end_of_day()),
        }
    }

    /// Build a range from form inputs. Absent or blank inputs fall back to
    /// the corresponding part of [`DateRange::for_day`] for `today`.
    pub fn from_inputs(
        from_date: Option<&str>,
        from_time: Option<&str>,
        to_date: Option<&str>,
        to_time: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, RangeError> {
        let from_date = non_blank(from_date).map(parse_date).transpose()?.unwrap_or(today);
        let from_time = non_blank(from_time)
            .map(parse_time)
            .transpose()?
            .unwrap_or_else(start_of_day);
        let to_date = non_blank(to_date).map(parse_date).transpose()?.unwrap_or(today);
        let to_time = non_blank(to_time)
            .map(parse_time)
            .transpose()?
            .unwrap_or_else(end_of_day);

        Self::new(from_date.and_time(from_time), to_date.and_time(to_time))
    }

    pub fn from_param(&self) -> String {
        encode(self.from.date(), self.from.time())
    }

    pub fn to_param(&self) -> String {
        encode(self.to.date(), self.to.time())
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| RangeError::InvalidDate(input.to_string()))
}

pub fn parse_time(input: &str) -> Result<NaiveTime, RangeError> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map_err(|_| RangeError::InvalidTime(input.to_string()))
}

fn non_blank(input: Option<&str>) -> Option<&str> {
    input.filter(|s| !s.trim().is_empty())
}

fn start_of_day() -> NaiveTime {
    NaiveTime::default()
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).expect("23:59:00 is a valid time of day")
}
