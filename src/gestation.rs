//! gestation.rs
//!
//! Period of amenorrhea (gestational age) from the current date and the
//! REDD.
//!
//! ```text
//! days remaining = REDD − current
//! days elapsed   = 280 − days remaining
//! POA            = days elapsed as weeks + days
//! ```
//!
//! A result outside 0..=50 weeks means the dates are wrong, not that the
//! learner is. Those cases are classified and never scored.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::days_between;
use crate::edd::FULL_TERM_DAYS;
use crate::explain::{Explanation, explain_poa};

/// Anything past this many weeks is treated as a date entry mistake.
pub const IMPLAUSIBLE_WEEKS: i64 = 50;

/// Weeks + days, with `days` always in 0..=6.
///
/// Built with floor division, so a negative day count gives negative weeks
/// and a non-negative remainder (−10 days is −2w 4d).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GestationalDuration {
    pub weeks: i64,
    pub days: i64,
}

impl GestationalDuration {
    pub fn from_days(total: i64) -> Self {
        Self {
            weeks: total.div_euclid(7),
            days: total.rem_euclid(7),
        }
    }

    pub fn total_days(&self) -> i64 {
        self.weeks * 7 + self.days
    }
}

impl fmt::Display for GestationalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w {}d", self.weeks, self.days)
    }
}

/// The numbers behind a POA answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoaReading {
    pub current: NaiveDate,
    pub redd: NaiveDate,
    pub days_remaining: i64,
    pub days_elapsed: i64,
    pub poa: GestationalDuration,
}

pub fn reading(current: NaiveDate, redd: NaiveDate) -> PoaReading {
    let days_remaining = days_between(current, redd);
    let days_elapsed = FULL_TERM_DAYS - days_remaining;

    PoaReading {
        current,
        redd,
        days_remaining,
        days_elapsed,
        poa: GestationalDuration::from_days(days_elapsed),
    }
}

/// POA on `current` for a pregnancy due on `redd`.
pub fn compute(current: NaiveDate, redd: NaiveDate) -> GestationalDuration {
    reading(current, redd).poa
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Valid,
    /// The current date is before the LMP.
    ImpossibleFuture,
    ImplausiblePostterm,
}

impl Category {
    pub fn message(self) -> Option<&'static str> {
        match self {
            Category::Valid => None,
            Category::ImpossibleFuture => {
                Some("Reference date precedes conception window: babies can't have negative age.")
            }
            Category::ImplausiblePostterm => {
                Some("Implausibly long gestation: check the years on both dates.")
            }
        }
    }
}

pub fn classify(poa: GestationalDuration) -> Category {
    if poa.weeks < 0 {
        Category::ImpossibleFuture
    } else if poa.weeks > IMPLAUSIBLE_WEEKS {
        Category::ImplausiblePostterm
    } else {
        Category::Valid
    }
}

/// Exact match on both weeks and days.
pub fn score(guess_weeks: i64, guess_days: i64, correct: GestationalDuration) -> bool {
    guess_weeks == correct.weeks && guess_days == correct.days
}

/// Preterm and term bands for a valid POA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermClass {
    PreViable,
    ExtremelyPreterm,
    VeryPreterm,
    LatePreterm,
    EarlyTerm,
    FullTerm,
    LateTerm,
    PostTerm,
}

impl TermClass {
    pub fn of(poa: GestationalDuration) -> Self {
        match poa.weeks {
            w if w < 24 => TermClass::PreViable,
            24..=27 => TermClass::ExtremelyPreterm,
            28..=31 => TermClass::VeryPreterm,
            32..=36 => TermClass::LatePreterm,
            37..=38 => TermClass::EarlyTerm,
            39..=40 => TermClass::FullTerm,
            41 => TermClass::LateTerm,
            _ => TermClass::PostTerm,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TermClass::PreViable => "Pre-viable",
            TermClass::ExtremelyPreterm => "Extremely preterm",
            TermClass::VeryPreterm => "Very preterm",
            TermClass::LatePreterm => "Late preterm",
            TermClass::EarlyTerm => "Early term",
            TermClass::FullTerm => "Full term",
            TermClass::LateTerm => "Late term",
            TermClass::PostTerm => "Post term",
        }
    }

    pub fn range(self) -> &'static str {
        match self {
            TermClass::PreViable => "< 24w",
            TermClass::ExtremelyPreterm => "24w - 27w+6",
            TermClass::VeryPreterm => "28w - 31w+6",
            TermClass::LatePreterm => "32w - 36w+6",
            TermClass::EarlyTerm => "37w - 38w+6",
            TermClass::FullTerm => "39w - 40w+6",
            TermClass::LateTerm => "41w - 41w+6",
            TermClass::PostTerm => ">= 42w",
        }
    }

    pub const ALL: [TermClass; 8] = [
        TermClass::PreViable,
        TermClass::ExtremelyPreterm,
        TermClass::VeryPreterm,
        TermClass::LatePreterm,
        TermClass::EarlyTerm,
        TermClass::FullTerm,
        TermClass::LateTerm,
        TermClass::PostTerm,
    ];
}

/// A learner's POA answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoaGuess {
    pub weeks: i64,
    pub days: i64,
}

/// Everything the presentation layer needs for one POA attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PoaReport {
    pub reading: PoaReading,
    pub category: Category,
    pub guess: Option<PoaGuess>,
    /// Only set for a valid case with a guess.
    pub is_correct: Option<bool>,
    pub term: Option<TermClass>,
    pub explanation: Option<Explanation>,
}

impl PoaReport {
    pub fn correct(&self) -> GestationalDuration {
        self.reading.poa
    }
}

/// Classify the case, then score and explain it when it is valid.
pub fn evaluate(current: NaiveDate, redd: NaiveDate, guess: Option<PoaGuess>) -> PoaReport {
    let reading = reading(current, redd);
    let category = classify(reading.poa);

    if category != Category::Valid {
        tracing::debug!(%current, %redd, weeks = reading.poa.weeks, ?category, "case not scored");
        return PoaReport {
            reading,
            category,
            guess,
            is_correct: None,
            term: None,
            explanation: None,
        };
    }

    let is_correct = guess.map(|g| score(g.weeks, g.days, reading.poa));
    let explanation = explain_poa(current, redd);
    debug_assert_eq!(explanation.poa(), reading.poa);

    tracing::debug!(
        %current,
        %redd,
        poa = %reading.poa,
        strategy = ?explanation.strategy(),
        "evaluated POA case"
    );

    PoaReport {
        reading,
        category,
        guess,
        is_correct,
        term: Some(TermClass::of(reading.poa)),
        explanation: Some(explanation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::add_days;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compute_reference_case() {
        let r = reading(ymd(2025, 3, 1), ymd(2025, 10, 8));
        assert_eq!(r.days_remaining, 221);
        assert_eq!(r.days_elapsed, 59);
        assert_eq!(r.poa, GestationalDuration { weeks: 8, days: 3 });
        assert_eq!(compute(ymd(2025, 3, 1), ymd(2025, 10, 8)), r.poa);
    }

    #[test]
    fn test_from_days_floor_semantics() {
        assert_eq!(GestationalDuration::from_days(59).to_string(), "8w 3d");
        assert_eq!(
            GestationalDuration::from_days(-1),
            GestationalDuration { weeks: -1, days: 6 }
        );
        for n in -50..400 {
            let d = GestationalDuration::from_days(n);
            assert!((0..7).contains(&d.days));
            assert_eq!(d.total_days(), n);
        }
    }

    #[test]
    fn test_classify_boundaries() {
        let on = |days| classify(GestationalDuration::from_days(days));
        assert_eq!(on(-1), Category::ImpossibleFuture);
        assert_eq!(on(0), Category::Valid);
        assert_eq!(on(50 * 7 + 6), Category::Valid);
        assert_eq!(on(51 * 7), Category::ImplausiblePostterm);
    }

    #[test]
    fn test_current_before_lmp_is_impossible() {
        let redd = ymd(2025, 10, 8);
        let report = evaluate(add_days(redd, -281), redd, Some(PoaGuess { weeks: 0, days: 0 }));
        assert_eq!(report.category, Category::ImpossibleFuture);
        assert!(report.is_correct.is_none());
        assert!(report.explanation.is_none());
        assert!(report.term.is_none());
        assert!(report.category.message().is_some());
    }

    #[test]
    fn test_years_too_far_apart_is_implausible() {
        let current = ymd(2026, 10, 8);
        let report = evaluate(current, ymd(2025, 10, 8), None);
        assert_eq!(report.correct().weeks, 92);
        assert_eq!(report.category, Category::ImplausiblePostterm);
        assert!(report.explanation.is_none());
    }

    #[test]
    fn test_overdue_but_valid() {
        let redd = ymd(2025, 10, 8);
        let report = evaluate(add_days(redd, 10), redd, Some(PoaGuess { weeks: 41, days: 3 }));
        assert_eq!(report.category, Category::Valid);
        assert_eq!(report.is_correct, Some(true));
        assert_eq!(report.term, Some(TermClass::LateTerm));
        assert_eq!(report.explanation.map(|e| e.poa()), Some(report.reading.poa));
    }

    #[test]
    fn test_score_requires_exact_match() {
        let correct = GestationalDuration { weeks: 8, days: 3 };
        assert!(score(8, 3, correct));
        assert!(!score(8, 2, correct));
        assert!(!score(9, 3, correct));
    }

    #[test]
    fn test_evaluate_valid_case() {
        let report = evaluate(
            ymd(2025, 3, 1),
            ymd(2025, 10, 8),
            Some(PoaGuess { weeks: 8, days: 4 }),
        );
        assert_eq!(report.category, Category::Valid);
        assert_eq!(report.is_correct, Some(false));
        assert_eq!(report.term, Some(TermClass::PreViable));
        assert!(report.explanation.is_some());
    }

    #[test]
    fn test_term_classes() {
        let at = |w| TermClass::of(GestationalDuration { weeks: w, days: 6 });
        assert_eq!(at(23), TermClass::PreViable);
        assert_eq!(at(24), TermClass::ExtremelyPreterm);
        assert_eq!(at(27), TermClass::ExtremelyPreterm);
        assert_eq!(at(28), TermClass::VeryPreterm);
        assert_eq!(at(32), TermClass::LatePreterm);
        assert_eq!(at(36), TermClass::LatePreterm);
        assert_eq!(at(37), TermClass::EarlyTerm);
        assert_eq!(at(39), TermClass::FullTerm);
        assert_eq!(at(40), TermClass::FullTerm);
        assert_eq!(at(41), TermClass::LateTerm);
        assert_eq!(at(42), TermClass::PostTerm);
    }
}
