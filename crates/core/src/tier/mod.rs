//! Partner tier calculation.
//!
//! A submission's tier is a pure function of how many of its events were
//! completed successfully. Thresholds are configurable; the committed tier
//! never goes down.

use serde::Serialize;
use thiserror::Error;

use crate::workflow::types::string_enum;

#[cfg(test)]
mod props;

string_enum! {
    /// Partner tier, ordered lowest to highest.
    pub enum Tier {
        /// Fewer successful events than the silver threshold.
        Bronze => "BRONZE",
        /// At least the silver threshold.
        Silver => "SILVER",
        /// At least the gold threshold.
        Gold => "GOLD",
        /// At least the platinum threshold.
        Platinum => "PLATINUM",
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Bronze
    }
}

/// Invalid threshold configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierError {
    /// Thresholds must satisfy 1 <= silver < gold < platinum.
    #[error("tier thresholds must be strictly increasing and start at 1 or more: silver={silver}, gold={gold}, platinum={platinum}")]
    NonIncreasing {
        /// Silver threshold.
        silver: u32,
        /// Gold threshold.
        gold: u32,
        /// Platinum threshold.
        platinum: u32,
    },
}

/// Minimum successful-event counts for each tier above bronze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierThresholds {
    silver: u32,
    gold: u32,
    platinum: u32,
}

impl TierThresholds {
    /// Validate and build thresholds.
    pub fn new(silver: u32, gold: u32, platinum: u32) -> Result<Self, TierError> {
        if silver == 0 || silver >= gold || gold >= platinum {
            return Err(TierError::NonIncreasing {
                silver,
                gold,
                platinum,
            });
        }
        Ok(Self {
            silver,
            gold,
            platinum,
        })
    }

    /// Silver threshold.
    #[must_use]
    pub const fn silver(&self) -> u32 {
        self.silver
    }

    /// Gold threshold.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Platinum threshold.
    #[must_use]
    pub const fn platinum(&self) -> u32 {
        self.platinum
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            silver: 3,
            gold: 5,
            platinum: 10,
        }
    }
}

/// Stateless tier calculator.
pub struct TierCalculator;

impl TierCalculator {
    /// Tier for a successful-event count.
    #[must_use]
    pub fn compute(count: u32, thresholds: &TierThresholds) -> Tier {
        if count >= thresholds.platinum {
            Tier::Platinum
        } else if count >= thresholds.gold {
            Tier::Gold
        } else if count >= thresholds.silver {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Tier to commit after the count changes: never below the current one.
    #[must_use]
    pub fn recompute(current: Tier, count: u32, thresholds: &TierThresholds) -> Tier {
        current.max(Self::compute(count, thresholds))
    }
}
