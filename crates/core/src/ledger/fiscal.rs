//! Fiscal calendar and journal numbering.
//!
//! Fiscal years are identified by the calendar year in which they start. With
//! an April start, 15 May 2024 falls in fiscal year 2024 (label `2024-25`),
//! period 2.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// A (fiscal year, period) pair. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Fiscal year (calendar year in which it starts).
    pub fiscal_year: i32,
    /// Period number within the fiscal year, 1-12.
    pub period: u32,
}

/// Fiscal calendar of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    start_month: u32,
}

impl FiscalCalendar {
    /// Creates a calendar whose fiscal year starts on the first of `start_month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFiscalStartMonth` unless `start_month` is 1-12.
    pub fn new(start_month: u32) -> Result<Self, LedgerError> {
        if (1..=12).contains(&start_month) {
            Ok(Self { start_month })
        } else {
            Err(LedgerError::InvalidFiscalStartMonth(start_month))
        }
    }

    /// Month in which the fiscal year starts.
    #[must_use]
    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    /// Fiscal year containing `date`.
    #[must_use]
    pub fn fiscal_year(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.start_month {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// Period number (1-12) of `date` within its fiscal year.
    #[must_use]
    pub fn period(&self, date: NaiveDate) -> u32 {
        (date.month() + 12 - self.start_month) % 12 + 1
    }

    /// Fiscal year and period of `date`.
    #[must_use]
    pub fn period_key(&self, date: NaiveDate) -> PeriodKey {
        PeriodKey {
            fiscal_year: self.fiscal_year(date),
            period: self.period(date),
        }
    }

    /// Display label of a fiscal year: `2024-25`, or `2024` for calendar years.
    #[must_use]
    pub fn label(&self, fiscal_year: i32) -> String {
        if self.start_month == 1 {
            fiscal_year.to_string()
        } else {
            format!("{fiscal_year}-{:02}", (fiscal_year + 1).rem_euclid(100))
        }
    }

    /// First day of a fiscal year.
    #[must_use]
    pub fn year_start(&self, fiscal_year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(fiscal_year, self.start_month, 1)
    }
}

/// Formats a journal number, e.g. `JV/2024-25/00001`.
#[must_use]
pub fn format_journal_number(prefix: &str, fiscal_year_label: &str, sequence: i64) -> String {
    format!("{prefix}/{fiscal_year_label}/{sequence:05}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2024, 4, 1), 2024, 1)]
    #[case(date(2024, 5, 15), 2024, 2)]
    #[case(date(2024, 12, 31), 2024, 9)]
    #[case(date(2025, 1, 1), 2024, 10)]
    #[case(date(2025, 3, 31), 2024, 12)]
    fn test_april_calendar(#[case] d: NaiveDate, #[case] fy: i32, #[case] period: u32) {
        let cal = FiscalCalendar::new(4).unwrap();
        assert_eq!(cal.fiscal_year(d), fy);
        assert_eq!(cal.period(d), period);
    }

    #[test]
    fn test_calendar_year() {
        let cal = FiscalCalendar::new(1).unwrap();
        assert_eq!(cal.period_key(date(2025, 7, 9)), PeriodKey { fiscal_year: 2025, period: 7 });
        assert_eq!(cal.label(2025), "2025");
    }

    #[test]
    fn test_labels() {
        let cal = FiscalCalendar::new(4).unwrap();
        assert_eq!(cal.label(2024), "2024-25");
        assert_eq!(cal.label(2099), "2099-00");
        assert_eq!(cal.year_start(2024), Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_invalid_start_month() {
        assert!(FiscalCalendar::new(0).is_err());
        assert!(FiscalCalendar::new(13).is_err());
    }

    #[test]
    fn test_period_key_ordering() {
        let cal = FiscalCalendar::new(4).unwrap();
        assert!(cal.period_key(date(2025, 3, 1)) < cal.period_key(date(2025, 4, 1)));
        assert!(cal.period_key(date(2024, 4, 1)) < cal.period_key(date(2024, 12, 1)));
    }

    #[test]
    fn test_journal_number_format() {
        assert_eq!(format_journal_number("JV", "2024-25", 1), "JV/2024-25/00001");
        assert_eq!(format_journal_number("JV", "2024-25", 123_456), "JV/2024-25/123456");
    }
}
