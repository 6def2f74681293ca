//! explain.rs
//!
//! Worked explanations for the period-of-amenorrhea questions.
//!
//! The month walk narrates the gap between two dates the way it is done on a
//! ward round:
//!     rest of the start month → whole middle months → days into the end month
//!
//! Each whole month counts as 4 weeks plus a few loose days (Big month +3,
//! Small month +2, leap February +1, February +0). The loose days are then
//! folded into weeks and the gap is subtracted from 40 weeks.
//!
//! The narrated pieces must add back up to the real calendar gap; the walk
//! never rounds or re-derives the total from the pieces.
//!
//! Steps are structured data. Turning them into text is left to the caller.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{days_between, days_in_month, days_left_in_month, first_of_next_month};
use crate::edd::FULL_TERM_DAYS;
use crate::gestation::GestationalDuration;

/// Gaps shorter than this are counted directly instead of walked.
pub const SHORT_GAP_DAYS: i64 = 28;

/// With at least this many days to go, counting up from the LMP is easier
/// than walking the months down to the due date.
pub const COUNT_UP_THRESHOLD_DAYS: i64 = 105;

pub const TERM_WEEKS: i64 = 40;

const WEEKS_PER_MONTH_BLOCK: i64 = 4;

/// Presentation hint for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Hint,
    Step,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum StepValue {
    Days(i64),
    Weeks(i64),
    Duration(GestationalDuration),
}

impl fmt::Display for StepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepValue::Days(d) => write!(f, "{d}d"),
            StepValue::Weeks(w) => write!(f, "{w}w"),
            StepValue::Duration(span) => write!(f, "{span}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationStep {
    pub kind: StepKind,
    pub label: String,
    pub value: Option<StepValue>,
    pub annotation: Option<String>,
}

/// Appends explanation steps in display order.
#[derive(Debug, Default)]
pub struct ExplanationBuilder {
    steps: Vec<ExplanationStep>,
}

impl ExplanationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hint(&mut self, label: impl Into<String>, annotation: impl Into<String>) -> &mut Self {
        self.push(StepKind::Hint, label.into(), None, Some(annotation.into()))
    }

    pub fn step(
        &mut self,
        label: impl Into<String>,
        value: StepValue,
        annotation: Option<String>,
    ) -> &mut Self {
        self.push(StepKind::Step, label.into(), Some(value), annotation)
    }

    pub fn result(
        &mut self,
        label: impl Into<String>,
        value: StepValue,
        annotation: Option<String>,
    ) -> &mut Self {
        self.push(StepKind::Final, label.into(), Some(value), annotation)
    }

    pub fn build(self) -> Vec<ExplanationStep> {
        self.steps
    }

    fn push(
        &mut self,
        kind: StepKind,
        label: String,
        value: Option<StepValue>,
        annotation: Option<String>,
    ) -> &mut Self {
        self.steps.push(ExplanationStep {
            kind,
            label,
            value,
            annotation,
        });
        self
    }
}

/// How a whole month compares to a 4-week block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthSize {
    /// 31 days, 4w + 3d
    Big,
    /// 30 days, 4w + 2d
    Small,
    /// leap February, 4w + 1d
    Leap,
    /// February, exactly 4w
    Feb,
}

impl MonthSize {
    pub fn from_length(days: u32) -> Self {
        match days {
            31 => MonthSize::Big,
            30 => MonthSize::Small,
            29 => MonthSize::Leap,
            _ => MonthSize::Feb,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MonthSize::Big => "Big",
            MonthSize::Small => "Small",
            MonthSize::Leap => "Leap",
            MonthSize::Feb => "Feb",
        }
    }
}

/// One whole month crossed by the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBlock {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub size: MonthSize,
    /// Days beyond the 4-week block (0..=3).
    pub surplus_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ShortGap,
    MonthWalk,
    CountUp,
}

impl Strategy {
    pub fn title(self) -> &'static str {
        match self {
            Strategy::ShortGap => "Short Gap Strategy",
            Strategy::MonthWalk => "Strategy: The \"Month Walk\"",
            Strategy::CountUp => "Strategy: \"The Count Up\"",
        }
    }
}

/// Decomposition of the gap between two dates, plus the countdown from
/// 40 weeks that turns the gap into a POA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapWalk {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub strategy: Strategy,
    /// `end - start` in days, straight from the calendar.
    pub total_days: i64,
    pub start_fragment: Option<i64>,
    pub months: Vec<MonthBlock>,
    pub end_fragment: Option<i64>,
    pub weeks_from_months: i64,
    /// Start fragment + every month surplus + end fragment.
    /// For a short gap this is the whole gap.
    pub surplus_days: i64,
    pub gap: GestationalDuration,
    pub countdown: GestationalDuration,
    pub steps: Vec<ExplanationStep>,
}

impl GapWalk {
    /// Day count rebuilt from the narrated pieces; always equals `total_days`.
    pub fn reconstructed_days(&self) -> i64 {
        self.weeks_from_months * 7 + self.surplus_days
    }
}

/// 40w 0d minus `gap`, borrowing a week when the gap has loose days.
pub fn countdown_from_term(gap: GestationalDuration) -> GestationalDuration {
    let weeks = TERM_WEEKS - gap.weeks;
    if gap.days > 0 {
        GestationalDuration {
            weeks: weeks - 1,
            days: 7 - gap.days,
        }
    } else {
        GestationalDuration { weeks, days: 0 }
    }
}

/// Explain the gap from `start` to `end` and count it down from 40 weeks.
///
/// Gaps under four weeks, including negative ones where `end` is already
/// behind `start`, are counted directly with floor division. Longer gaps are
/// walked month by month.
pub fn walk(start: NaiveDate, end: NaiveDate) -> GapWalk {
    let total_days = days_between(start, end);

    let walk = if total_days < SHORT_GAP_DAYS {
        short_gap(start, end, total_days)
    } else {
        month_walk(start, end, total_days)
    };

    debug_assert_eq!(walk.reconstructed_days(), walk.total_days);
    tracing::debug!(
        %start,
        %end,
        total_days,
        strategy = ?walk.strategy,
        months = walk.months.len(),
        "walked gap"
    );

    walk
}

fn short_gap(start: NaiveDate, end: NaiveDate, total_days: i64) -> GapWalk {
    let gap = GestationalDuration::from_days(total_days);
    let countdown = countdown_from_term(gap);

    let mut b = ExplanationBuilder::new();
    b.hint(
        Strategy::ShortGap.title(),
        "Less than a month. Just count weeks directly.",
    )
    .step("The Gap", StepValue::Days(total_days), None)
    .step(
        "Weeks",
        StepValue::Duration(gap),
        Some(format!("{total_days} ÷ 7")),
    )
    .result(
        "Countdown",
        StepValue::Duration(countdown),
        Some(format!("40w 0d − {gap}")),
    );

    GapWalk {
        start,
        end,
        strategy: Strategy::ShortGap,
        total_days,
        start_fragment: None,
        months: Vec::new(),
        end_fragment: None,
        weeks_from_months: 0,
        surplus_days: total_days,
        gap,
        countdown,
        steps: b.build(),
    }
}

fn month_walk(start: NaiveDate, end: NaiveDate, total_days: i64) -> GapWalk {
    let mut b = ExplanationBuilder::new();
    b.hint(
        Strategy::MonthWalk.title(),
        "1. Rest of current month. 2. Full middle months. 3. Days in final month.",
    );

    let end_month = (end.year(), end.month());

    // A 28-30 day gap inside one long month lands here.
    let start_fragment = if (start.year(), start.month()) == end_month {
        (end.day() - start.day()) as i64
    } else {
        days_left_in_month(start) as i64
    };
    let mut surplus_days = start_fragment;
    b.step(
        format!("Rest of {}", month_name(start)),
        StepValue::Days(start_fragment),
        (start_fragment == 0).then(|| "End of month".to_string()),
    );

    let mut weeks_from_months = 0;
    let mut months = Vec::new();
    let mut cursor = first_of_next_month(start);

    while (cursor.year(), cursor.month()) < end_month {
        let length = days_in_month(cursor.year(), cursor.month());
        let size = MonthSize::from_length(length);
        let surplus = length as i64 - 28;
        let name = month_name(cursor);

        b.step(
            name.clone(),
            StepValue::Duration(GestationalDuration {
                weeks: WEEKS_PER_MONTH_BLOCK,
                days: surplus,
            }),
            Some(size.label().to_string()),
        );

        weeks_from_months += WEEKS_PER_MONTH_BLOCK;
        surplus_days += surplus;
        months.push(MonthBlock {
            year: cursor.year(),
            month: cursor.month(),
            name,
            size,
            surplus_days: surplus,
        });

        cursor = first_of_next_month(cursor);
    }

    let end_fragment = if (cursor.year(), cursor.month()) == end_month {
        let fragment = end.day() as i64;
        b.step(
            format!("Days in {}", month_name(end)),
            StepValue::Days(fragment),
            None,
        );
        surplus_days += fragment;
        Some(fragment)
    } else {
        None
    };

    let surplus_weeks = surplus_days.div_euclid(7);
    let gap = GestationalDuration {
        weeks: weeks_from_months + surplus_weeks,
        days: surplus_days.rem_euclid(7),
    };
    let countdown = countdown_from_term(gap);

    b.step("Weeks from Months", StepValue::Weeks(weeks_from_months), None)
        .step("Loose Days Sum", StepValue::Days(surplus_days), None)
        .step(
            "Simplify",
            StepValue::Duration(gap),
            Some(format!(
                "{weeks_from_months}w + {surplus_weeks}w {}d",
                gap.days
            )),
        )
        .result(
            "The Countdown (40w - Gap)",
            StepValue::Duration(countdown),
            Some(format!("40w 0d − {gap}")),
        );

    GapWalk {
        start,
        end,
        strategy: Strategy::MonthWalk,
        total_days,
        start_fragment: Some(start_fragment),
        months,
        end_fragment,
        weeks_from_months,
        surplus_days,
        gap,
        countdown,
        steps: b.build(),
    }
}

/// Early-pregnancy explanation: days passed since the LMP, then weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountUp {
    pub days_remaining: i64,
    pub days_elapsed: i64,
    pub poa: GestationalDuration,
    pub steps: Vec<ExplanationStep>,
}

pub fn count_up(days_remaining: i64) -> CountUp {
    let days_elapsed = FULL_TERM_DAYS - days_remaining;
    let poa = GestationalDuration::from_days(days_elapsed);

    let mut b = ExplanationBuilder::new();
    b.hint(
        Strategy::CountUp.title(),
        "Since it's early, counting forward is safer than subtracting backwards.",
    )
    .step(
        "Total Days Passed",
        StepValue::Days(days_elapsed),
        Some(format!(
            "{FULL_TERM_DAYS} (Full Term) − {days_remaining} (Remaining)"
        )),
    )
    .step(
        "Convert to Weeks",
        StepValue::Weeks(poa.weeks),
        Some(format!("{days_elapsed} ÷ 7")),
    )
    .step("Remainder", StepValue::Days(poa.days), Some("Leftover days".to_string()))
    .result("Result", StepValue::Duration(poa), None);

    CountUp {
        days_remaining,
        days_elapsed,
        poa,
        steps: b.build(),
    }
}

/// The explanation shown for a valid POA question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explanation {
    Walk(GapWalk),
    CountUp(CountUp),
}

impl Explanation {
    pub fn strategy(&self) -> Strategy {
        match self {
            Explanation::Walk(w) => w.strategy,
            Explanation::CountUp(_) => Strategy::CountUp,
        }
    }

    pub fn steps(&self) -> &[ExplanationStep] {
        match self {
            Explanation::Walk(w) => &w.steps,
            Explanation::CountUp(c) => &c.steps,
        }
    }

    /// The POA the explanation arrives at.
    pub fn poa(&self) -> GestationalDuration {
        match self {
            Explanation::Walk(w) => w.countdown,
            Explanation::CountUp(c) => c.poa,
        }
    }
}

/// Pick the strategy for a POA question: walk the months down to the REDD
/// when term is near, count up from the LMP otherwise.
pub fn explain_poa(current: NaiveDate, redd: NaiveDate) -> Explanation {
    let days_remaining = days_between(current, redd);
    if days_remaining < COUNT_UP_THRESHOLD_DAYS {
        Explanation::Walk(walk(current, redd))
    } else {
        Explanation::CountUp(count_up(days_remaining))
    }
}

fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}
