//! Cron module - 5-field cron schedules for recurring sweeps
//!
//! Fields are `minute hour day-of-month month day-of-week`. Each field accepts
//! `*`, single values, ranges (`a-b`), steps (`*/n`, `a-b/n`, `a/n`) and comma
//! separated lists. Months and weekdays also accept three-letter English
//! names. Weekday `0` and `7` both mean Sunday.
//!
//! Day-of-month and day-of-week are combined with AND: a day matches only if
//! both fields match.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when a cron expression cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    /// Expression does not have exactly five fields
    #[error("expected 5 fields (minute hour day month weekday), found {0}")]
    FieldCount(usize),

    /// A field item could not be parsed
    #[error("invalid {field} field item '{value}'")]
    InvalidField {
        /// Field name (e.g. "minute")
        field: &'static str,
        /// Offending text
        value: String,
    },

    /// A value lies outside the field's range
    #[error("{field} value {value} is out of range")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u32,
    },
}

#[derive(Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    // value of names[0]
    name_base: u32,
}

const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: &[],
    name_base: 0,
};

const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: &[],
    name_base: 0,
};

const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    name_base: 0,
};

const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &[
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ],
    name_base: 1,
};

const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &["sun", "mon", "tue", "wed", "thu", "fri", "sat"],
    name_base: 0,
};

/// A parsed 5-field cron schedule
///
/// # Examples
///
/// ```
/// use dustpan_domain::CronSchedule;
///
/// let schedule = CronSchedule::parse("30 3 * * mon-fri").unwrap();
/// // Monday 03:30 on the 7th of March
/// assert!(schedule.matches(30, 3, 7, 3, 1));
/// // Sunday
/// assert!(!schedule.matches(30, 3, 6, 3, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: u64,
    hours: u64,
    days: u64,
    months: u64,
    weekdays: u64,
}

impl CronSchedule {
    /// Parse a 5-field cron expression
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        let mut weekdays = parse_field(fields[4], DAY_OF_WEEK)?;
        // 7 is an alias for Sunday
        if weekdays & (1 << 7) != 0 {
            weekdays = (weekdays & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes: parse_field(fields[0], MINUTE)?,
            hours: parse_field(fields[1], HOUR)?,
            days: parse_field(fields[2], DAY_OF_MONTH)?,
            months: parse_field(fields[3], MONTH)?,
            weekdays,
        })
    }

    /// The normalized expression (single-space separated)
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether the minute field allows `minute` (0-59)
    pub fn matches_minute(&self, minute: u32) -> bool {
        bit(self.minutes, minute)
    }

    /// Whether the hour field allows `hour` (0-23)
    pub fn matches_hour(&self, hour: u32) -> bool {
        bit(self.hours, hour)
    }

    /// Whether the month field allows `month` (1-12)
    pub fn matches_month(&self, month: u32) -> bool {
        bit(self.months, month)
    }

    /// Whether a calendar day matches both day fields
    ///
    /// `weekday` counts from Sunday = 0.
    pub fn matches_day(&self, day_of_month: u32, weekday: u32) -> bool {
        bit(self.days, day_of_month) && bit(self.weekdays, weekday % 7)
    }

    /// Whether the given calendar minute is a firing time
    pub fn matches(&self, minute: u32, hour: u32, day_of_month: u32, month: u32, weekday: u32) -> bool {
        self.matches_month(month)
            && self.matches_day(day_of_month, weekday)
            && self.matches_hour(hour)
            && self.matches_minute(minute)
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn bit(mask: u64, value: u32) -> bool {
    value < 64 && mask & (1u64 << value) != 0
}

fn parse_field(text: &str, spec: FieldSpec) -> Result<u64, CronError> {
    let invalid = |item: &str| CronError::InvalidField {
        field: spec.name,
        value: item.to_string(),
    };

    let mut mask = 0u64;
    for item in text.split(',') {
        if item.is_empty() {
            return Err(invalid(text));
        }

        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid(item))?;
                if step == 0 {
                    return Err(invalid(item));
                }
                (range, Some(step))
            }
            None => (item, None),
        };

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_value(a, spec)?, parse_value(b, spec)?)
        } else {
            let value = parse_value(range, spec)?;
            // `a/n` runs from a to the end of the field
            if step.is_some() {
                (value, spec.max)
            } else {
                (value, value)
            }
        };

        if start > end {
            return Err(invalid(item));
        }

        let step = step.unwrap_or(1);
        let mut value = start;
        while value <= end {
            mask |= 1u64 << value;
            value += step;
        }
    }

    Ok(mask)
}

fn parse_value(text: &str, spec: FieldSpec) -> Result<u32, CronError> {
    let lower = text.to_ascii_lowercase();
    let value = match spec.names.iter().position(|name| *name == lower) {
        Some(index) => index as u32 + spec.name_base,
        None => lower.parse::<u32>().map_err(|_| CronError::InvalidField {
            field: spec.name,
            value: text.to_string(),
        })?,
    };

    if value < spec.min || value > spec.max {
        return Err(CronError::OutOfRange {
            field: spec.name,
            value,
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_at_three() {
        let schedule = CronSchedule::parse("0 3 * * *").unwrap();
        assert!(schedule.matches(0, 3, 15, 6, 2));
        assert!(!schedule.matches(1, 3, 15, 6, 2));
        assert!(!schedule.matches(0, 4, 15, 6, 2));
        assert_eq!(schedule.expression(), "0 3 * * *");
    }

    #[test]
    fn test_steps_and_lists() {
        let schedule = CronSchedule::parse("*/15 8-18/2 1,15 * *").unwrap();
        for minute in [0, 15, 30, 45] {
            assert!(schedule.matches_minute(minute));
        }
        assert!(!schedule.matches_minute(10));
        assert!(schedule.matches_hour(8));
        assert!(schedule.matches_hour(18));
        assert!(!schedule.matches_hour(9));
        assert!(schedule.matches_day(1, 3));
        assert!(schedule.matches_day(15, 3));
        assert!(!schedule.matches_day(2, 3));
    }

    #[test]
    fn test_value_with_step_runs_to_end() {
        let schedule = CronSchedule::parse("50/5 * * * *").unwrap();
        assert!(schedule.matches_minute(50));
        assert!(schedule.matches_minute(55));
        assert!(!schedule.matches_minute(45));
    }

    #[test]
    fn test_names() {
        let schedule = CronSchedule::parse("0 0 * Jan,jul MON-fri").unwrap();
        assert!(schedule.matches_month(1));
        assert!(schedule.matches_month(7));
        assert!(!schedule.matches_month(2));
        assert!(schedule.matches_day(10, 1));
        assert!(schedule.matches_day(10, 5));
        assert!(!schedule.matches_day(10, 6));
        assert!(!schedule.matches_day(10, 0));
    }

    #[test]
    fn test_sunday_aliases() {
        let seven = CronSchedule::parse("0 0 * * 7").unwrap();
        let zero = CronSchedule::parse("0 0 * * 0").unwrap();
        assert!(seven.matches_day(1, 0));
        assert!(zero.matches_day(1, 0));
        assert!(!seven.matches_day(1, 6));
    }

    #[test]
    fn test_day_fields_combine_with_and() {
        let schedule = CronSchedule::parse("0 0 13 * fri").unwrap();
        assert!(schedule.matches_day(13, 5));
        assert!(!schedule.matches_day(13, 4));
        assert!(!schedule.matches_day(14, 5));
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let schedule: CronSchedule = "  0   3 * *   * ".parse().unwrap();
        assert_eq!(schedule.to_string(), "0 3 * * *");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(CronSchedule::parse("* * * *"), Err(CronError::FieldCount(4)));
        assert_eq!(CronSchedule::parse(""), Err(CronError::FieldCount(0)));
        assert!(matches!(
            CronSchedule::parse("0 0 3 * * *"),
            Err(CronError::FieldCount(6))
        ));
        assert!(matches!(
            CronSchedule::parse("60 * * * *"),
            Err(CronError::OutOfRange { field: "minute", value: 60 })
        ));
        assert!(matches!(
            CronSchedule::parse("*/0 * * * *"),
            Err(CronError::InvalidField { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("5-1 * * * *"),
            Err(CronError::InvalidField { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("abc * * * *"),
            Err(CronError::InvalidField { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0 0 0 * *"),
            Err(CronError::OutOfRange { field: "day-of-month", .. })
        ));
        assert!(matches!(
            CronSchedule::parse("1,,2 * * * *"),
            Err(CronError::InvalidField { .. })
        ));
    }
}
