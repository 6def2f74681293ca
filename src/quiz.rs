//! Interactive drill: draw a case, read an answer, show the worked solution.
//!
//! The session is a plain value threaded through the loop; nothing here is
//! global.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use clap::ValueEnum;
use obgyn_trainer::case::{CaseGenerator, TrainingCase};
use obgyn_trainer::edd::{self, EddReport};
use obgyn_trainer::gestation::{self, PoaGuess, PoaReport};
use rand::Rng;

use crate::render::{self, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QuizMode {
    /// EDD from an LMP (Naegele's rule)
    Edd,
    /// Gestational age from a REDD
    Poa,
}

/// The currently displayed case and the running score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub case: Option<TrainingCase>,
    pub attempted: u32,
    pub correct: u32,
}

impl Session {
    pub fn with_case(self, case: TrainingCase) -> Self {
        Self {
            case: Some(case),
            ..self
        }
    }

    /// Count a scored attempt. Unscored outcomes leave the tally alone.
    pub fn record(self, verdict: Option<bool>) -> Self {
        match verdict {
            Some(ok) => Self {
                attempted: self.attempted + 1,
                correct: self.correct + u32::from(ok),
                ..self
            },
            None => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Edd(NaiveDate),
    Poa(PoaGuess),
}

#[derive(Debug, Clone)]
pub enum Report {
    Edd(EddReport),
    Poa(PoaReport),
}

impl Report {
    pub fn verdict(&self) -> Option<bool> {
        match self {
            Report::Edd(r) => r.score.map(|s| s.is_correct),
            Report::Poa(r) => r.is_correct,
        }
    }

    pub fn render(&self, theme: Theme) -> String {
        match self {
            Report::Edd(r) => render::render_edd(r, theme),
            Report::Poa(r) => render::render_poa(r, theme),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        match self {
            Report::Edd(r) => render::to_json(r),
            Report::Poa(r) => render::to_json(r),
        }
    }
}

/// Evaluate `case`, scoring `answer` when one is given.
pub fn check(case: TrainingCase, answer: Option<Answer>) -> Result<Report> {
    match case {
        TrainingCase::Edd { lmp } => {
            let guess = match answer {
                None => None,
                Some(Answer::Edd(date)) => Some(date),
                Some(Answer::Poa(_)) => bail!("an EDD case needs a date answer"),
            };
            Ok(Report::Edd(edd::evaluate(lmp, guess)))
        }
        TrainingCase::Gestation { current, redd } => {
            let guess = match answer {
                None => None,
                Some(Answer::Poa(guess)) => Some(guess),
                Some(Answer::Edd(_)) => bail!("a gestation case needs a weeks + days answer"),
            };
            Ok(Report::Poa(gestation::evaluate(current, redd, guess)))
        }
    }
}

/// Accepts `32 4`, `32w 4d`, `32w4d`, `32+4` or a bare `32`.
pub fn parse_poa_answer(s: &str) -> Result<PoaGuess> {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            'w' | 'W' | 'd' | 'D' | '+' | ',' => ' ',
            other => other,
        })
        .collect();

    let numbers = cleaned
        .split_whitespace()
        .map(|part| part.parse::<i64>().with_context(|| format!("{part:?} is not a number")))
        .collect::<Result<Vec<_>>>()?;

    let (weeks, days) = match numbers.as_slice() {
        [weeks] => (*weeks, 0),
        [weeks, days] => (*weeks, *days),
        _ => bail!("expected weeks and days, e.g. 32w 4d"),
    };
    ensure!(weeks >= 0, "weeks cannot be negative");
    ensure!((0..=6).contains(&days), "days must be between 0 and 6");

    Ok(PoaGuess { weeks, days })
}

pub fn parse_answer(mode: QuizMode, s: &str) -> Result<Answer> {
    match mode {
        QuizMode::Edd => render::parse_date(s).map(Answer::Edd),
        QuizMode::Poa => parse_poa_answer(s).map(Answer::Poa),
    }
}

fn prompt(mode: QuizMode) -> &'static str {
    match mode {
        QuizMode::Edd => "What is the EDD? (DD/MM/YYYY, q to quit)",
        QuizMode::Poa => "What is the POA? (e.g. 32w 4d, q to quit)",
    }
}

pub struct QuizOptions {
    pub mode: QuizMode,
    pub near_term: bool,
    pub rounds: Option<u32>,
    pub theme: Theme,
}

/// Run rounds until input ends, the learner types `q`, or `rounds` is hit.
pub fn run<I, O, G>(
    input: I,
    output: &mut O,
    generator: &mut CaseGenerator<G>,
    options: &QuizOptions,
) -> Result<Session>
where
    I: BufRead,
    O: Write,
    G: Rng,
{
    let mut session = Session::default();
    let mut lines = input.lines();

    'rounds: for round in 1u32.. {
        if options.rounds.is_some_and(|max| round > max) {
            break;
        }

        let case = match options.mode {
            QuizMode::Edd => generator.random_edd_case(),
            QuizMode::Poa => generator.random_gestational_case(options.near_term),
        };
        session = session.with_case(case);

        writeln!(output, "\nRound {round}")?;
        write!(output, "{}", render::render_case(&case, options.theme))?;
        writeln!(output, "{}", prompt(options.mode))?;

        let answer = loop {
            output.flush()?;
            let Some(line) = lines.next() else {
                break 'rounds;
            };
            let line = line.context("failed to read answer")?;
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
                break 'rounds;
            }
            match parse_answer(options.mode, line) {
                Ok(answer) => break answer,
                Err(e) => {
                    tracing::debug!(input = line, "rejected answer: {e:#}");
                    writeln!(output, "{e:#}. Try again:")?;
                }
            }
        };

        let report = check(case, Some(answer))?;
        write!(output, "{}", report.render(options.theme))?;
        session = session.record(report.verdict());
    }

    writeln!(output, "\nScore: {}/{}", session.correct, session.attempted)?;
    tracing::info!(
        attempted = session.attempted,
        correct = session.correct,
        "quiz finished"
    );
    Ok(session)
}
