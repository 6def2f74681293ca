//! Obstetric date arithmetic for an EDD / gestational-age trainer.
//!
//! The library is pure computation over `chrono::NaiveDate`: it takes dates
//! and answers and hands back structured results and explanation steps.
//! Formatting and session handling live in the `obgyn-trainer` binary.

pub mod calendar;
pub mod case;
pub mod config;
pub mod edd;
pub mod explain;
pub mod gestation;

pub use case::{CaseGenerator, Clock, OffsetPolicy, SystemClock, TrainingCase};
pub use config::TrainerConfig;
pub use edd::EddReport;
pub use explain::{Explanation, ExplanationStep, GapWalk};
pub use gestation::{Category, GestationalDuration, PoaGuess, PoaReport};
