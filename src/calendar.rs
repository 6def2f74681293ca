//! calendar.rs
//!
//! Calendar primitives used by every calculator in the trainer.
//!
//! Chrono gives us day arithmetic, but month and year shifts need the
//! clamping rule the bedside mnemonics rely on (Jan 31 + 1 month is the last
//! day of February, never a date in March), so those are done by hand.
//!
//! This logic correctly handles:
//!   • month overflow/underflow (carrying into the year)
//!   • day clamping to the target month length
//!   • leap years, including the 100/400 century rules
//!   • varying month lengths

use chrono::{Datelike, Duration, NaiveDate};

/// Returns number of days in a given year/month (handles leap years)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30, // should never occur but keeps function total
    }
}

/// Leap-year rule (Gregorian):
///   - divisible by 4 → leap year
///   - except divisible by 100 → not leap year
///   - except divisible by 400 → leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days left in the month of `date` after `date` itself (0 on the last day).
pub fn days_left_in_month(date: NaiveDate) -> u32 {
    days_in_month(date.year(), date.month()) - date.day()
}

/// Shift `date` by `n` days in either direction.
///
/// # Panics
///
/// Panics if the result falls outside chrono's supported date range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    date + Duration::days(n)
}

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Shift the month field of `date` by `n` (may be negative), carrying into
/// the year and clamping the day to the length of the resulting month.
///
/// # Panics
///
/// Panics if the resulting year falls outside chrono's supported range.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    let month0 = date.month0() as i32 + n;
    let year = date.year() + month0.div_euclid(12);
    let month = month0.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day)
        .expect("day is clamped to the month length, so only the year can be out of range")
}

/// Shift the year of `date` by `n`, keeping month and day. Feb 29 lands on
/// Feb 28 when the target year is not a leap year.
pub fn add_years(date: NaiveDate, n: i32) -> NaiveDate {
    add_months(date, n * 12)
}

/// First day of the month following the month of `date`.
pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    add_months(first, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_year_century_rules() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2025));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2400));
    }

    #[test]
    fn test_days_in_month_matches_chrono() {
        for year in 1896..=2104 {
            for month in 1..=12 {
                let first = ymd(year, month, 1);
                let next = first.checked_add_months(chrono::Months::new(1)).unwrap();
                assert_eq!(
                    days_in_month(year, month) as i64,
                    days_between(first, next),
                    "{year}-{month}"
                );
            }
        }
    }

    #[test]
    fn test_days_in_month_table() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_add_days_round_trip() {
        let mut d = ymd(1999, 12, 1);
        let end = ymd(2001, 3, 31);
        while d <= end {
            for n in [-400, -29, -1, 0, 1, 28, 59, 280, 366] {
                let shifted = add_days(d, n);
                assert_eq!(days_between(d, shifted), n);
                assert_eq!(add_days(shifted, -n), d);
            }
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_add_days_rolls_over_leap_day() {
        assert_eq!(add_days(ymd(2024, 2, 28), 1), ymd(2024, 2, 29));
        assert_eq!(add_days(ymd(2024, 2, 29), 1), ymd(2024, 3, 1));
        assert_eq!(add_days(ymd(2025, 2, 28), 1), ymd(2025, 3, 1));
        assert_eq!(add_days(ymd(2025, 1, 1), -1), ymd(2024, 12, 31));
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(ymd(2025, 1, 31), 1), ymd(2025, 2, 28));
        assert_eq!(add_months(ymd(2024, 1, 31), 1), ymd(2024, 2, 29));
        assert_eq!(add_months(ymd(2025, 3, 31), 1), ymd(2025, 4, 30));
        assert_eq!(add_months(ymd(2025, 5, 31), -3), ymd(2025, 2, 28));
    }

    #[test]
    fn test_add_months_carries_year() {
        assert_eq!(add_months(ymd(2025, 2, 15), -3), ymd(2024, 11, 15));
        assert_eq!(add_months(ymd(2025, 11, 15), 3), ymd(2026, 2, 15));
        assert_eq!(add_months(ymd(2025, 1, 10), -13), ymd(2023, 12, 10));
        assert_eq!(add_months(ymd(2025, 12, 10), 25), ymd(2028, 1, 10));
    }

    #[test]
    fn test_add_years_feb_29() {
        assert_eq!(add_years(ymd(2024, 2, 29), 1), ymd(2025, 2, 28));
        assert_eq!(add_years(ymd(2024, 2, 29), 4), ymd(2028, 2, 29));
        assert_eq!(add_years(ymd(2025, 6, 14), 1), ymd(2026, 6, 14));
    }

    #[test]
    fn test_first_of_next_month() {
        assert_eq!(first_of_next_month(ymd(2025, 1, 31)), ymd(2025, 2, 1));
        assert_eq!(first_of_next_month(ymd(2025, 12, 5)), ymd(2026, 1, 1));
    }

    #[test]
    fn test_days_left_in_month() {
        assert_eq!(days_left_in_month(ymd(2025, 1, 10)), 21);
        assert_eq!(days_left_in_month(ymd(2024, 2, 29)), 0);
        assert_eq!(days_left_in_month(ymd(2025, 2, 1)), 27);
    }
}
