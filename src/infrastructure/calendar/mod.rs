//! NSE trading calendar seed (§11.2): wraps `domain::calendar::TradingCalendar`
//! with the published 2026 NSE holiday list. Extending to a new year means
//! appending a block here, not touching the domain type.

use chrono::NaiveDate;

use crate::domain::calendar::TradingCalendar;

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// NSE cash-market holidays, 2026. Tentative dates (lunar-calendar festivals)
/// follow the published trading-holiday circular and may shift by a day or
/// two if NSE amends it later in the year.
fn holidays_2026() -> Vec<NaiveDate> {
    vec![
        d(2026, 1, 26),  // Republic Day
        d(2026, 3, 10),  // Maha Shivaratri
        d(2026, 3, 30),  // Holi
        d(2026, 3, 31),  // Id-ul-Fitr (tentative)
        d(2026, 4, 2),   // Ram Navami
        d(2026, 4, 3),   // Good Friday
        d(2026, 4, 14),  // Dr. Ambedkar Jayanti
        d(2026, 5, 1),   // Maharashtra Day
        d(2026, 6, 7),   // Id-ul-Adha (tentative)
        d(2026, 7, 7),   // Muharram (tentative)
        d(2026, 8, 15),  // Independence Day
        d(2026, 8, 19),  // Janmashtami
        d(2026, 9, 5),   // Milad-un-Nabi (tentative)
        d(2026, 10, 2),  // Gandhi Jayanti
        d(2026, 10, 20), // Dussehra
        d(2026, 11, 9),  // Diwali (Laxmi Pujan)
        d(2026, 11, 10), // Diwali (Balipratipada)
        d(2026, 11, 30), // Guru Nanak Jayanti
        d(2026, 12, 25), // Christmas
    ]
}

/// Builds the `TradingCalendar` used by the scheduler and chat commands,
/// seeded with every year this adapter currently carries holiday data for.
pub fn build() -> TradingCalendar {
    TradingCalendar::new(holidays_2026())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn republic_day_2026_is_not_a_trading_day() {
        let cal = build();
        assert_eq!(cal.is_trading_day(d(2026, 1, 26)), Ok(false));
    }

    #[test]
    fn an_ordinary_2026_weekday_is_a_trading_day() {
        let cal = build();
        assert_eq!(cal.is_trading_day(d(2026, 7, 30)), Ok(true));
    }

    #[test]
    fn a_year_with_no_holiday_data_is_surfaced() {
        let cal = build();
        assert!(cal.is_trading_day(d(2027, 1, 4)).is_err());
    }
}
