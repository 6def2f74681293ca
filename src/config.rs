//! Trainer settings shared by the command line and the quiz loop.

use anyhow::{Result, ensure};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::case::{CaseGenerator, OffsetPolicy};

pub const DEFAULT_YEAR_START: i32 = 2025;
pub const DEFAULT_YEAR_END: i32 = 2027;

/// Random dates are kept inside this window.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerConfig {
    pub year_start: i32,
    pub year_end: i32,
    pub offset_policy: OffsetPolicy,
    /// Fixed seed for reproducible cases; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            year_start: DEFAULT_YEAR_START,
            year_end: DEFAULT_YEAR_END,
            offset_policy: OffsetPolicy::default(),
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.year_start <= self.year_end,
            "year range is empty: start {} is after end {}",
            self.year_start,
            self.year_end
        );
        ensure!(
            SUPPORTED_YEARS.contains(&self.year_start) && SUPPORTED_YEARS.contains(&self.year_end),
            "years must be within {}..={}",
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end()
        );
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn case_generator(&self) -> Result<CaseGenerator<StdRng>> {
        self.validate()?;
        tracing::debug!(config = ?self, "building case generator");
        CaseGenerator::new(self.rng(), self.year_start, self.year_end, self.offset_policy)
    }
}
