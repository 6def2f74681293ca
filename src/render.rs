use chrono::NaiveDate;
use crossterm::style::{Color, Stylize};
use obgyn_trainer::case::TrainingCase;
use obgyn_trainer::edd::{EDD_TOLERANCE_DAYS, EddReport};
use obgyn_trainer::explain::{ExplanationStep, StepKind};
use obgyn_trainer::gestation::{Category, PoaReport, TermClass};

const MIN_ALIGN_CHARS: usize = 44;
const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Plain,
    Color,
}

/// Foreground colors per card element. `None` leaves the text unstyled.
pub struct ThemeColors {
    pub key: Option<Color>,
    pub value: Option<Color>,
    pub cc: Option<Color>,
    pub good: Option<Color>,
    pub bad: Option<Color>,
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Plain => ThemeColors {
                key: None,
                value: None,
                cc: None,
                good: None,
                bad: None,
            },
            Theme::Color => ThemeColors {
                key: Some(Color::AnsiValue(215)),
                value: Some(Color::AnsiValue(153)),
                cc: Some(Color::AnsiValue(244)),
                good: Some(Color::Green),
                bad: Some(Color::Red),
            },
        }
    }
}

fn paint(text: &str, color: Option<Color>) -> String {
    match color {
        Some(color) => text.with(color).to_string(),
        None => text.to_string(),
    }
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    use anyhow::Context;
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date {s:?}, please use DD/MM/YYYY"))
}

fn width(s: &str) -> usize {
    s.chars().count()
}

pub fn build_stat_row(key: &str, value: &str, align_width: usize) -> (String, String, String) {
    let key_part = format!("{key}: ");
    let base_len = width(&key_part) + width(value);
    let available = align_width.saturating_sub(base_len);

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => ".".repeat(n),
    };

    (key_part, dots, value.to_string())
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(width(&base)) + 2;
    format!("{base}{}", "-".repeat(dash_count))
}

enum Line {
    Header(String),
    Blank,
    Stat { key: String, value: String },
    Verdict { ok: bool, text: String },
    Note(String),
}

/// A block of aligned `key: ....... value` rows under section headers.
#[derive(Default)]
struct Card {
    lines: Vec<Line>,
}

impl Card {
    fn header(&mut self, label: impl Into<String>) -> &mut Self {
        if !self.lines.is_empty() {
            self.lines.push(Line::Blank);
        }
        self.lines.push(Line::Header(label.into()));
        self
    }

    fn stat(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Stat {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    fn verdict(&mut self, ok: bool, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Verdict {
            ok,
            text: text.into(),
        });
        self
    }

    fn note(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Note(text.into()));
        self
    }

    fn blank_note(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(Line::Blank);
        self.note(text)
    }

    fn steps(&mut self, steps: &[ExplanationStep]) -> &mut Self {
        for step in steps {
            match step.kind {
                StepKind::Hint => {
                    self.note(format!("» {}", step.label));
                    if let Some(a) = &step.annotation {
                        self.note(format!("  {a}"));
                    }
                }
                StepKind::Step | StepKind::Final => {
                    let mut value = step.value.map(|v| v.to_string()).unwrap_or_default();
                    if let Some(a) = &step.annotation {
                        value = format!("{value} ({a})");
                    }
                    let key = if step.kind == StepKind::Final {
                        format!("= {}", step.label)
                    } else {
                        step.label.clone()
                    };
                    self.stat(key, value);
                }
            }
        }
        self
    }

    fn render(&self, theme: Theme) -> String {
        let c = theme.colors();

        let align_width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                Line::Stat { key, value } => Some(width(key) + 2 + width(value)),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            .max(MIN_ALIGN_CHARS);

        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Blank => {}
                Line::Header(text) => {
                    out.push_str(&paint(&build_header_line(text, align_width), c.key));
                }
                Line::Stat { key, value } => {
                    let (k, d, v) = build_stat_row(key, value, align_width);
                    out.push_str(&paint(". ", c.cc));
                    out.push_str(&paint(&k, c.key));
                    out.push_str(&paint(&d, c.cc));
                    out.push_str(&paint(&v, c.value));
                }
                Line::Verdict { ok, text } => {
                    out.push_str(&paint(text, if *ok { c.good } else { c.bad }));
                }
                Line::Note(text) => out.push_str(&paint(text, c.cc)),
            }
            out.push('\n');
        }
        out
    }
}

pub fn render_case(case: &TrainingCase, theme: Theme) -> String {
    let mut card = Card::default();
    match case {
        TrainingCase::Edd { lmp } => {
            card.header("Patient").stat("LMP", format_date(*lmp));
        }
        TrainingCase::Gestation { current, redd } => {
            card.header("Patient")
                .stat("Current date", format_date(*current))
                .stat("REDD (due date)", format_date(*redd));
        }
    }
    card.render(theme)
}

pub fn render_edd(report: &EddReport, theme: Theme) -> String {
    let mut card = Card::default();
    card.header("EDD (Naegele's Rule)");

    if let (Some(guess), Some(score)) = (report.guess, report.score) {
        if score.is_correct {
            card.verdict(true, format!("Correct! (within {} days)", score.difference_days));
        } else {
            card.verdict(
                false,
                format!(
                    "Incorrect. You were off by {} days (tolerance {EDD_TOLERANCE_DAYS}).",
                    score.difference_days
                ),
            );
        }
        card.stat("Your answer", format_date(guess));
    }
    card.stat("Exact 280 days", format_date(report.exact_edd));

    card.header("Step-by-step");
    card.stat("LMP", format_date(report.naegele.lmp));
    for step in report.naegele.steps() {
        card.stat(step.label, format_date(step.date));
    }
    card.stat("= Computer exact (280 days)", format_date(report.exact_edd));

    if report.naegele.result() != report.exact_edd {
        card.note("The rule of thumb and the exact count disagree for this LMP.");
    }
    if report.crosses_leap_day {
        card.note("LEAP YEAR DETECTED (FEB 29): this calculation crossed a leap day!");
    }

    card.render(theme)
}

pub fn render_poa(report: &PoaReport, theme: Theme) -> String {
    let reading = &report.reading;
    let mut card = Card::default();
    card.header("Gestational Age (from REDD)")
        .stat("Current date", format_date(reading.current))
        .stat("REDD (due date)", format_date(reading.redd));

    match report.category {
        Category::ImpossibleFuture | Category::ImplausiblePostterm => {
            let message = report.category.message().unwrap_or_default();
            card.verdict(false, message);
            card.stat("Computed weeks", reading.poa.weeks.to_string());
            return card.render(theme);
        }
        Category::Valid => {}
    }

    match (report.guess, report.is_correct) {
        (Some(_), Some(true)) => {
            card.verdict(true, "Correct! Spot on.");
        }
        (Some(guess), _) => {
            card.verdict(false, "Incorrect.");
            card.stat("Your answer", format!("{}w {}d", guess.weeks, guess.days));
        }
        (None, _) => {}
    }
    card.stat("Correct POA", reading.poa.to_string());
    if let Some(term) = report.term {
        card.stat("Classification", term.label());
    }

    if let Some(explanation) = &report.explanation {
        card.header("Mental Math Strategy").steps(explanation.steps());
    }

    card.render(theme)
}

pub fn render_cheatsheet(theme: Theme) -> String {
    let mut card = Card::default();
    card.header("Prerequisites for Naegele's Rule")
        .stat("Sure of date", "patient remembers LMP clearly")
        .stat("Regular cycles", "28 days (+/- a few days)")
        .stat("No hormonal contraception", "stopped > 3 months ago")
        .stat("No breastfeeding", "no lactational amenorrhea")
        .header("The Formula")
        .note("EDD = LMP + 7 days − 3 months ± 1 year")
        .header("Mental Math Tricks")
        .stat("Big month (31d)", "4w + 3d")
        .stat("Small month (30d)", "4w + 2d")
        .stat("Leap February", "4w + 1d")
        .stat("February", "4w exactly")
        .header("Preterm and Term");
    for term in TermClass::ALL {
        card.stat(term.label(), term.range());
    }
    card.note("Viability is around 24 weeks.")
        .blank_note("FOR EDUCATIONAL PURPOSES ONLY. NOT FOR CLINICAL DIAGNOSIS.");
    card.render(theme)
}

pub fn to_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    use anyhow::Context;
    serde_json::to_string_pretty(value).context("failed to serialize report as JSON")
}
