//! NSE trading-day calendar (§11.2): weekday ∧ not in the holiday set for the
//! year. Missing holiday data for a year is surfaced, not silently ignored --
//! the scheduler logs a warning and runs the job anyway rather than failing
//! closed on an unmaintained table.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

#[derive(Debug, Clone)]
pub struct TradingCalendar {
    holidays_by_year: HashMap<i32, HashSet<NaiveDate>>,
}

impl TradingCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut holidays_by_year: HashMap<i32, HashSet<NaiveDate>> = HashMap::new();
        for date in holidays {
            holidays_by_year.entry(date.year()).or_default().insert(date);
        }
        Self { holidays_by_year }
    }

    /// `Ok(true/false)` when the year has holiday data, `Err` (year unknown)
    /// when it doesn't -- callers decide whether to run the job anyway.
    pub fn is_trading_day(&self, date: NaiveDate) -> Result<bool, UnknownYear> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Ok(false);
        }
        match self.holidays_by_year.get(&date.year()) {
            Some(holidays) => Ok(!holidays.contains(&date)),
            None => Err(UnknownYear(date.year())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no NSE holiday data for year {0}")]
pub struct UnknownYear(pub i32);

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_never_trading_days() {
        let cal = TradingCalendar::new([]);
        // 2026-03-01 is a Sunday.
        assert_eq!(cal.is_trading_day(ymd(2026, 3, 1)), Ok(false));
    }

    #[test]
    fn a_listed_holiday_is_not_a_trading_day() {
        let cal = TradingCalendar::new([ymd(2026, 1, 26)]);
        assert_eq!(cal.is_trading_day(ymd(2026, 1, 26)), Ok(false));
    }

    #[test]
    fn an_ordinary_weekday_is_a_trading_day() {
        let cal = TradingCalendar::new([ymd(2026, 1, 26)]);
        assert_eq!(cal.is_trading_day(ymd(2026, 3, 2)), Ok(true));
    }

    #[test]
    fn unknown_year_is_surfaced_as_an_error() {
        let cal = TradingCalendar::new([ymd(2026, 1, 26)]);
        assert_eq!(
            cal.is_trading_day(ymd(2027, 3, 2)),
            Err(UnknownYear(2027))
        );
    }
}
