//! The `YYMM` reporting period.

use crate::config::CalendarSettings;
use crate::error::{RoyaltyError, RoyaltyResult};
use std::fmt;

/// A validated reporting month. The year is kept as the two-digit value the
/// command line and the events API both use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportingPeriod {
    year: u32,
    month: u32,
}

impl ReportingPeriod {
    /// Parse a `YYMM` code. The year must be the current or the previous one
    /// relative to `current_year` (a four-digit calendar year).
    pub fn parse(code: &str, current_year: i32) -> RoyaltyResult<Self> {
        let trimmed = code.trim();
        if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RoyaltyError::invalid_period(
                code,
                "expected a 4-digit YYMM code",
            ));
        }
        let value: u32 = trimmed
            .parse()
            .map_err(|_| RoyaltyError::invalid_period(code, "expected a 4-digit YYMM code"))?;
        let year = value / 100;
        let month = value % 100;

        let newest = current_year - 2000;
        let oldest = newest - 1;
        if (year as i32) < oldest || (year as i32) > newest {
            return Err(RoyaltyError::invalid_period(
                code,
                format!("year must be between {oldest} and {newest}"),
            ));
        }
        if !(1..=12).contains(&month) {
            return Err(RoyaltyError::invalid_period(
                code,
                "month must be between 1 and 12",
            ));
        }

        Ok(Self { year, month })
    }

    /// Two-digit year
    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn full_year(&self) -> u32 {
        2000 + self.year
    }

    /// Month number, 1-12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The `YYMM` code used for API calls and file names.
    pub fn code(&self) -> String {
        format!("{:02}{:02}", self.year, self.month)
    }

    pub fn days(&self, calendar: &CalendarSettings) -> u32 {
        calendar
            .days
            .get(self.month as usize - 1)
            .copied()
            .unwrap_or(30)
    }

    pub fn month_name<'a>(&self, calendar: &'a CalendarSettings) -> &'a str {
        calendar
            .names
            .get(self.month as usize - 1)
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_current_and_previous_year() {
        let period = ReportingPeriod::parse("2603", 2026).expect("period");
        assert_eq!(period.year(), 26);
        assert_eq!(period.month(), 3);
        assert_eq!(period.full_year(), 2026);
        assert_eq!(period.code(), "2603");

        let last_year = ReportingPeriod::parse("2512", 2026).expect("previous year");
        assert_eq!(last_year.month(), 12);
    }

    #[test]
    fn rejects_out_of_window_years() {
        assert_matches!(
            ReportingPeriod::parse("2401", 2026),
            Err(RoyaltyError::InvalidPeriod { .. })
        );
        assert_matches!(
            ReportingPeriod::parse("2701", 2026),
            Err(RoyaltyError::InvalidPeriod { .. })
        );
    }

    #[test]
    fn rejects_bad_months_and_shapes() {
        let err = ReportingPeriod::parse("2613", 2026).expect_err("month 13");
        assert!(err.to_string().contains("month must be between 1 and 12"));
        assert!(ReportingPeriod::parse("2600", 2026).is_err());
        assert!(ReportingPeriod::parse("263", 2026).is_err());
        assert!(ReportingPeriod::parse("26a3", 2026).is_err());
    }

    #[test]
    fn february_is_always_28_days() {
        let calendar = CalendarSettings::default();
        let feb = ReportingPeriod::parse("2602", 2026).expect("feb");
        assert_eq!(feb.days(&calendar), 28);
        assert_eq!(feb.month_name(&calendar), "February");
        let sept = ReportingPeriod::parse("2609", 2026).expect("sept");
        assert_eq!(sept.days(&calendar), 30);
    }
}
