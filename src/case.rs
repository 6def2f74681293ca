//! case.rs
//!
//! Training cases: randomly drawn dates for the quiz, plus the clock used to
//! default custom input.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;

use crate::calendar::{add_days, days_between};
use crate::edd::FULL_TERM_DAYS;

/// Near-term cases have at most this many days to go (past 30 weeks).
pub const NEAR_TERM_MAX_OFFSET_DAYS: i64 = 70;
pub const NEAR_TERM_MIN_OFFSET_DAYS: i64 = 1;

/// Lower bound for the non-near-term offset, under either policy.
pub const MIN_OFFSET_DAYS: i64 = 7;

/// Non-near-term upper bound, roughly 4 to 40 weeks of gestation.
pub const STANDARD_MAX_OFFSET_DAYS: i64 = 250;

/// Non-near-term upper bound used by the simpler drill.
pub const SIMPLE_MAX_OFFSET_DAYS: i64 = 210;

/// How far ahead of the current date a random REDD may fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetPolicy {
    #[default]
    Standard,
    Simple,
}

impl OffsetPolicy {
    pub fn max_offset_days(self) -> i64 {
        match self {
            OffsetPolicy::Standard => STANDARD_MAX_OFFSET_DAYS,
            OffsetPolicy::Simple => SIMPLE_MAX_OFFSET_DAYS,
        }
    }
}

impl FromStr for OffsetPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(OffsetPolicy::Standard),
            "simple" => Ok(OffsetPolicy::Simple),
            other => bail!("unknown offset policy {other:?} (expected \"standard\" or \"simple\")"),
        }
    }
}

/// One quiz question. Lives for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrainingCase {
    Edd { lmp: NaiveDate },
    Gestation { current: NaiveDate, redd: NaiveDate },
}

/// Source of "today" for defaulting custom input.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Custom LMP input starts on today.
pub fn default_lmp(clock: &impl Clock) -> NaiveDate {
    clock.today()
}

/// Custom REDD input starts a full term after today.
pub fn default_redd(clock: &impl Clock) -> NaiveDate {
    add_days(clock.today(), FULL_TERM_DAYS)
}

/// Uniform draw over every day from Jan 1 of `year_start` to Dec 31 of
/// `year_end`.
pub fn random_date<R: Rng + ?Sized>(
    rng: &mut R,
    year_start: i32,
    year_end: i32,
) -> Result<NaiveDate> {
    let (first, last) = year_span(year_start, year_end)?;
    Ok(random_date_between(rng, first, last))
}

fn random_date_between<R: Rng + ?Sized>(
    rng: &mut R,
    first: NaiveDate,
    last: NaiveDate,
) -> NaiveDate {
    let span = days_between(first, last).max(0);
    add_days(first, rng.gen_range(0..=span))
}

fn year_span(year_start: i32, year_end: i32) -> Result<(NaiveDate, NaiveDate)> {
    if year_start > year_end {
        bail!("year range is empty: {year_start} > {year_end}");
    }
    let first = NaiveDate::from_ymd_opt(year_start, 1, 1)
        .with_context(|| format!("year {year_start} is outside the supported calendar"))?;
    let last = NaiveDate::from_ymd_opt(year_end, 12, 31)
        .with_context(|| format!("year {year_end} is outside the supported calendar"))?;
    Ok((first, last))
}

/// Days from the current date to a random REDD.
pub fn random_offset<R: Rng + ?Sized>(rng: &mut R, near_term: bool, policy: OffsetPolicy) -> i64 {
    if near_term {
        rng.gen_range(NEAR_TERM_MIN_OFFSET_DAYS..=NEAR_TERM_MAX_OFFSET_DAYS)
    } else {
        rng.gen_range(MIN_OFFSET_DAYS..=policy.max_offset_days())
    }
}

/// Draws training cases from an injected random source.
#[derive(Debug)]
pub struct CaseGenerator<R> {
    rng: R,
    first: NaiveDate,
    last: NaiveDate,
    policy: OffsetPolicy,
}

impl<R: Rng> CaseGenerator<R> {
    pub fn new(rng: R, year_start: i32, year_end: i32, policy: OffsetPolicy) -> Result<Self> {
        let (first, last) = year_span(year_start, year_end)?;
        Ok(Self {
            rng,
            first,
            last,
            policy,
        })
    }

    pub fn random_date(&mut self) -> NaiveDate {
        random_date_between(&mut self.rng, self.first, self.last)
    }

    pub fn random_edd_case(&mut self) -> TrainingCase {
        let lmp = self.random_date();
        tracing::debug!(%lmp, "generated EDD case");
        TrainingCase::Edd { lmp }
    }

    pub fn random_gestational_case(&mut self, near_term: bool) -> TrainingCase {
        let current = self.random_date();
        let offset = random_offset(&mut self.rng, near_term, self.policy);
        let redd = add_days(current, offset);
        tracing::debug!(%current, %redd, offset, near_term, "generated gestation case");
        TrainingCase::Gestation { current, redd }
    }
}
