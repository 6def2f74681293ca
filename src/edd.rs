//! edd.rs
//!
//! Estimated due date from the last menstrual period.
//!
//! Two answers are produced side by side and never merged:
//!   • the exact due date, LMP + 280 days
//!   • Naegele's rule, LMP + 1 year − 3 months + 7 days
//!
//! The mnemonic can drift from the exact date by a few days around short
//! months and leap years. Showing both is the point of the exercise.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{add_days, add_months, add_years, days_between, is_leap_year};

/// Length of a full-term pregnancy counted from the LMP.
pub const FULL_TERM_DAYS: i64 = 280;

/// A guess within this many days of the exact EDD is accepted.
pub const EDD_TOLERANCE_DAYS: i64 = 3;

/// The exact due date: LMP + 280 days.
pub fn compute_edd(lmp: NaiveDate) -> NaiveDate {
    add_days(lmp, FULL_TERM_DAYS)
}

/// One line of the Naegele derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NaegeleStep {
    pub label: &'static str,
    pub date: NaiveDate,
}

/// Naegele's rule worked out from an LMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NaegeleDerivation {
    pub lmp: NaiveDate,
    pub plus_one_year: NaiveDate,
    pub minus_three_months: NaiveDate,
    pub plus_seven_days: NaiveDate,
}

impl NaegeleDerivation {
    /// The three transforms in order. The LMP itself is not a step.
    pub fn steps(&self) -> Vec<NaegeleStep> {
        vec![
            NaegeleStep {
                label: "Add 1 Year",
                date: self.plus_one_year,
            },
            NaegeleStep {
                label: "Subtract 3 Months",
                date: self.minus_three_months,
            },
            NaegeleStep {
                label: "Add 7 Days",
                date: self.plus_seven_days,
            },
        ]
    }

    /// Result of the mnemonic.
    pub fn result(&self) -> NaiveDate {
        self.plus_seven_days
    }
}

/// Apply Naegele's rule step by step.
pub fn naegele_steps(lmp: NaiveDate) -> NaegeleDerivation {
    let plus_one_year = add_years(lmp, 1);
    let minus_three_months = add_months(plus_one_year, -3);
    let plus_seven_days = add_days(minus_three_months, 7);

    NaegeleDerivation {
        lmp,
        plus_one_year,
        minus_three_months,
        plus_seven_days,
    }
}

/// How far a learner's EDD is from the exact one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EddScore {
    pub difference_days: i64,
    pub is_correct: bool,
}

pub fn score(lmp: NaiveDate, guess: NaiveDate) -> EddScore {
    let difference_days = days_between(compute_edd(lmp), guess).abs();
    EddScore {
        difference_days,
        is_correct: difference_days <= EDD_TOLERANCE_DAYS,
    }
}

/// True iff some Feb 29 lies in the closed interval `[lmp, edd]`.
///
/// Checks each year the interval touches instead of walking day by day.
pub fn crosses_leap_day(lmp: NaiveDate, edd: NaiveDate) -> bool {
    if lmp > edd {
        return false;
    }

    (lmp.year()..=edd.year())
        .filter(|&year| is_leap_year(year))
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 2, 29))
        .any(|leap_day| lmp <= leap_day && leap_day <= edd)
}

/// Everything the presentation layer needs for one EDD attempt.
#[derive(Debug, Clone, Serialize)]
pub struct EddReport {
    pub lmp: NaiveDate,
    pub guess: Option<NaiveDate>,
    pub exact_edd: NaiveDate,
    pub naegele: NaegeleDerivation,
    pub score: Option<EddScore>,
    pub crosses_leap_day: bool,
}

/// Work out the EDD for `lmp` and score `guess` when one was given.
pub fn evaluate(lmp: NaiveDate, guess: Option<NaiveDate>) -> EddReport {
    let exact_edd = compute_edd(lmp);
    let naegele = naegele_steps(lmp);
    let score = guess.map(|g| score(lmp, g));
    let crosses_leap_day = crosses_leap_day(lmp, exact_edd);

    tracing::debug!(
        %lmp,
        %exact_edd,
        naegele = %naegele.result(),
        crosses_leap_day,
        "evaluated EDD case"
    );

    EddReport {
        lmp,
        guess,
        exact_edd,
        naegele,
        score,
        crosses_leap_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn brute_force_leap_scan(lmp: NaiveDate, edd: NaiveDate) -> bool {
        let mut d = lmp;
        while d <= edd {
            if d.month() == 2 && d.day() == 29 {
                return true;
            }
            d = d.succ_opt().unwrap();
        }
        false
    }

    #[test]
    fn test_compute_edd_non_leap() {
        assert_eq!(compute_edd(ymd(2025, 1, 1)), ymd(2025, 10, 8));
    }

    #[test]
    fn test_compute_edd_leap() {
        assert_eq!(compute_edd(ymd(2024, 2, 1)), ymd(2024, 11, 7));
        assert!(crosses_leap_day(ymd(2024, 2, 1), ymd(2024, 11, 7)));
    }

    #[test]
    fn test_naegele_steps_plain() {
        let n = naegele_steps(ymd(2025, 1, 1));
        assert_eq!(n.plus_one_year, ymd(2026, 1, 1));
        assert_eq!(n.minus_three_months, ymd(2025, 10, 1));
        assert_eq!(n.plus_seven_days, ymd(2025, 10, 8));

        let labels: Vec<_> = n.steps().iter().map(|s| s.label).collect();
        assert_eq!(labels, ["Add 1 Year", "Subtract 3 Months", "Add 7 Days"]);
    }

    #[test]
    fn test_naegele_feb_29_lmp() {
        let n = naegele_steps(ymd(2024, 2, 29));
        assert_eq!(n.plus_one_year, ymd(2025, 2, 28));
        assert_eq!(n.minus_three_months, ymd(2024, 11, 28));
        assert_eq!(n.plus_seven_days, ymd(2024, 12, 5));
        assert_eq!(compute_edd(ymd(2024, 2, 29)), ymd(2024, 12, 5));
    }

    #[test]
    fn test_naegele_can_drift_from_exact() {
        // May 31 clamps to Feb 28 on the way back
        let lmp = ymd(2025, 5, 31);
        let n = naegele_steps(lmp);
        assert_eq!(n.minus_three_months, ymd(2026, 2, 28));
        assert_eq!(n.result(), ymd(2026, 3, 7));
        assert_eq!(compute_edd(lmp), ymd(2026, 3, 7));

        let lmp = ymd(2025, 3, 1);
        assert_eq!(naegele_steps(lmp).result(), ymd(2025, 12, 8));
        assert_eq!(compute_edd(lmp), ymd(2025, 12, 6));
    }

    #[test]
    fn test_score_tolerance_band() {
        let lmp = ymd(2025, 1, 1);
        let exact = compute_edd(lmp);

        let s = score(lmp, exact);
        assert_eq!(s.difference_days, 0);
        assert!(s.is_correct);

        assert!(score(lmp, add_days(exact, 3)).is_correct);
        assert!(score(lmp, add_days(exact, -3)).is_correct);

        let late = score(lmp, add_days(exact, 4));
        assert_eq!(late.difference_days, 4);
        assert!(!late.is_correct);

        let early = score(lmp, add_days(exact, -10));
        assert_eq!(early.difference_days, 10);
        assert!(!early.is_correct);
    }

    #[test]
    fn test_crosses_leap_day_matches_brute_force() {
        let mut lmp = ymd(1899, 1, 1);
        let last = ymd(1901, 6, 1);
        while lmp <= last {
            let edd = compute_edd(lmp);
            assert_eq!(crosses_leap_day(lmp, edd), brute_force_leap_scan(lmp, edd), "{lmp}");
            lmp = lmp.succ_opt().unwrap();
        }

        let mut lmp = ymd(2023, 1, 1);
        let last = ymd(2028, 12, 31);
        while lmp <= last {
            let edd = compute_edd(lmp);
            assert_eq!(crosses_leap_day(lmp, edd), brute_force_leap_scan(lmp, edd), "{lmp}");
            lmp = lmp.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_crosses_leap_day_boundaries() {
        assert!(crosses_leap_day(ymd(2024, 2, 29), ymd(2024, 2, 29)));
        assert!(!crosses_leap_day(ymd(2024, 3, 1), ymd(2024, 12, 6)));
        assert!(crosses_leap_day(ymd(2023, 6, 1), ymd(2024, 2, 29)));
        assert!(!crosses_leap_day(ymd(2024, 11, 7), ymd(2024, 2, 1)));
        assert!(!crosses_leap_day(ymd(2099, 6, 1), ymd(2100, 3, 8)));
    }

    #[test]
    fn test_evaluate_without_guess() {
        let r = evaluate(ymd(2025, 1, 1), None);
        assert_eq!(r.exact_edd, ymd(2025, 10, 8));
        assert!(r.score.is_none());
        assert!(!r.crosses_leap_day);
    }
}
