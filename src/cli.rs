// Command line surface. Parses flags, builds the case, hands it to the
// library and prints the report. No date arithmetic happens here.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use obgyn_trainer::case::{self, Clock, OffsetPolicy, SystemClock, TrainingCase};
use obgyn_trainer::config::{DEFAULT_YEAR_END, DEFAULT_YEAR_START, TrainerConfig};
use obgyn_trainer::gestation::PoaGuess;

use crate::quiz::{self, Answer, QuizMode, QuizOptions};
use crate::render::{self, Theme, parse_date};

#[derive(Parser, Debug)]
#[command(
    name = "obgyn-trainer",
    version,
    about = "Practise EDD (Naegele's rule) and gestational age calculations."
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the report as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// First year random dates are drawn from
    #[arg(long, global = true, env = "OBGYN_YEAR_START", default_value_t = DEFAULT_YEAR_START)]
    pub year_start: i32,

    /// Last year random dates are drawn from
    #[arg(long, global = true, env = "OBGYN_YEAR_END", default_value_t = DEFAULT_YEAR_END)]
    pub year_end: i32,

    /// Upper bound for random REDD offsets: standard (250 days) or simple (210 days)
    #[arg(long, global = true, env = "OBGYN_OFFSET_POLICY", default_value = "standard")]
    pub offset_policy: OffsetPolicy,

    /// Seed for reproducible random cases
    #[arg(long, global = true, env = "OBGYN_SEED")]
    pub seed: Option<u64>,
}

impl From<ConfigArgs> for TrainerConfig {
    fn from(a: ConfigArgs) -> Self {
        TrainerConfig {
            year_start: a.year_start,
            year_end: a.year_end,
            offset_policy: a.offset_policy,
            seed: a.seed,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work out the EDD from an LMP and check your answer
    Edd(EddArgs),

    /// Work out the POA from the current date and REDD
    Poa(PoaArgs),

    /// Interactive drill with random cases
    Quiz(QuizArgs),

    /// Print Naegele's prerequisites, month tricks and term definitions
    Cheatsheet,
}

#[derive(Args, Debug)]
pub struct EddArgs {
    /// LMP as DD/MM/YYYY (defaults to today)
    #[arg(long, value_parser = parse_date, conflicts_with = "random")]
    pub lmp: Option<NaiveDate>,

    /// Draw a random LMP
    #[arg(long)]
    pub random: bool,

    /// Your EDD as DD/MM/YYYY; leave out to reveal the worked solution
    #[arg(long, value_parser = parse_date)]
    pub guess: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct PoaArgs {
    /// Current date as DD/MM/YYYY (defaults to today)
    #[arg(long, value_parser = parse_date, conflicts_with = "random")]
    pub current: Option<NaiveDate>,

    /// REDD as DD/MM/YYYY (defaults to today + 280 days)
    #[arg(long, value_parser = parse_date, conflicts_with = "random")]
    pub redd: Option<NaiveDate>,

    /// Draw a random case
    #[arg(long)]
    pub random: bool,

    /// Only draw cases past 30 weeks
    #[arg(long, requires = "random")]
    pub near_term: bool,

    /// Your answer: weeks
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=42))]
    pub weeks: Option<i64>,

    /// Your answer: days
    #[arg(long, requires = "weeks", value_parser = clap::value_parser!(i64).range(0..=6))]
    pub days: Option<i64>,
}

#[derive(Args, Debug)]
pub struct QuizArgs {
    #[arg(long, value_enum, default_value_t = QuizMode::Poa)]
    pub mode: QuizMode,

    /// Only draw cases past 30 weeks (POA mode)
    #[arg(long)]
    pub near_term: bool,

    /// Stop after this many rounds
    #[arg(long)]
    pub rounds: Option<u32>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = TrainerConfig::from(self.config);
        config.validate()?;

        let theme = if self.plain || !io::stdout().is_terminal() {
            Theme::Plain
        } else {
            Theme::Color
        };

        match self.command {
            Commands::Edd(args) => run_edd(args, &config, self.json, theme),
            Commands::Poa(args) => run_poa(args, &config, self.json, theme),
            Commands::Quiz(args) => run_quiz(args, &config, theme),
            Commands::Cheatsheet => {
                print!("{}", render::render_cheatsheet(theme));
                Ok(())
            }
        }
    }
}

fn run_edd(args: EddArgs, config: &TrainerConfig, json: bool, theme: Theme) -> Result<()> {
    let case = if args.random {
        config.case_generator()?.random_edd_case()
    } else {
        TrainingCase::Edd {
            lmp: args.lmp.unwrap_or_else(|| case::default_lmp(&SystemClock)),
        }
    };
    tracing::debug!(?case, "checking EDD");

    print_report(case, args.guess.map(Answer::Edd), json, theme)
}

fn run_poa(args: PoaArgs, config: &TrainerConfig, json: bool, theme: Theme) -> Result<()> {
    let case = if args.random {
        config
            .case_generator()?
            .random_gestational_case(args.near_term)
    } else {
        let current = args.current.unwrap_or_else(|| SystemClock.today());
        let redd = args.redd.unwrap_or_else(|| case::default_redd(&SystemClock));
        TrainingCase::Gestation { current, redd }
    };
    tracing::debug!(?case, "checking POA");

    let guess = args.weeks.map(|weeks| PoaGuess {
        weeks,
        days: args.days.unwrap_or(0),
    });
    print_report(case, guess.map(Answer::Poa), json, theme)
}

fn print_report(
    case: TrainingCase,
    answer: Option<Answer>,
    json: bool,
    theme: Theme,
) -> Result<()> {
    let report = quiz::check(case, answer)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render(theme));
    }
    Ok(())
}

fn run_quiz(args: QuizArgs, config: &TrainerConfig, theme: Theme) -> Result<()> {
    let mut generator = config.case_generator()?;
    let options = QuizOptions {
        mode: args.mode,
        near_term: args.near_term,
        rounds: args.rounds,
        theme,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    quiz::run(stdin.lock(), &mut stdout, &mut generator, &options)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("obgyn-trainer").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_flags_after_subcommand() {
        let cli = parse(&[
            "poa",
            "--random",
            "--year-start",
            "2030",
            "--year-end",
            "2031",
            "--offset-policy",
            "simple",
            "--seed",
            "9",
        ])
        .unwrap();

        let config = TrainerConfig::from(cli.config);
        assert_eq!(
            config,
            TrainerConfig {
                year_start: 2030,
                year_end: 2031,
                offset_policy: OffsetPolicy::Simple,
                seed: Some(9),
            }
        );
    }

    #[test]
    fn test_year_defaults() {
        let cli = parse(&["cheatsheet"]).unwrap();
        assert_eq!(cli.config.year_start, DEFAULT_YEAR_START);
        assert_eq!(cli.config.year_end, DEFAULT_YEAR_END);
        assert!(matches!(cli.command, Commands::Cheatsheet));
    }

    #[test]
    fn test_env_fills_config_and_flags_win() {
        // SAFETY: no other test sets these two variables or asserts on their values
        unsafe {
            std::env::set_var("OBGYN_OFFSET_POLICY", "simple");
            std::env::set_var("OBGYN_SEED", "3");
        }

        let from_env = parse(&["poa", "--random", "--near-term"]).map(|cli| cli.config);
        let from_flags = parse(&["--offset-policy", "standard", "--seed", "4", "quiz"])
            .map(|cli| cli.config);

        unsafe {
            std::env::remove_var("OBGYN_OFFSET_POLICY");
            std::env::remove_var("OBGYN_SEED");
        }

        let from_env = from_env.unwrap();
        assert_eq!(from_env.offset_policy, OffsetPolicy::Simple);
        assert_eq!(from_env.seed, Some(3));

        let from_flags = from_flags.unwrap();
        assert_eq!(from_flags.offset_policy, OffsetPolicy::Standard);
        assert_eq!(from_flags.seed, Some(4));
    }

    #[test]
    fn test_unknown_offset_policy_rejected() {
        let err = parse(&["--offset-policy", "bogus", "cheatsheet"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_near_term_requires_random() {
        let err = parse(&["poa", "--near-term"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(parse(&["poa", "--random", "--near-term"]).is_ok());
    }

    #[test]
    fn test_explicit_dates_conflict_with_random() {
        let err = parse(&["edd", "--random", "--lmp", "01/03/2025"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = parse(&["poa", "--random", "--redd", "08/10/2025"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_dates_parse_as_day_month_year() {
        let cli = parse(&["edd", "--lmp", "01/03/2025", "--guess", "08/12/2025"]).unwrap();
        let Commands::Edd(args) = cli.command else {
            panic!("expected the edd command");
        };
        assert_eq!(args.lmp, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(args.guess, NaiveDate::from_ymd_opt(2025, 12, 8));

        let err = parse(&["edd", "--lmp", "2025-03-01"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_poa_answer_ranges() {
        let cli = parse(&["poa", "--weeks", "32", "--days", "6"]).unwrap();
        let Commands::Poa(args) = cli.command else {
            panic!("expected the poa command");
        };
        assert_eq!((args.weeks, args.days), (Some(32), Some(6)));

        let err = parse(&["poa", "--weeks", "32", "--days", "7"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = parse(&["poa", "--days", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
