//! Half-cycle classification into full cycles and phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of current flow within a half cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Charge,
    Discharge,
}

impl Phase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Discharge => "discharge",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which phase an even half-cycle index denotes.
///
/// Instruments commonly start on charge, but a protocol may open with a
/// discharge step; the parity rule is therefore chosen per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseConvention {
    /// Even half cycles charge, odd half cycles discharge.
    #[default]
    ChargeFirst,
    /// Even half cycles discharge, odd half cycles charge.
    DischargeFirst,
}

impl PhaseConvention {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChargeFirst => "charge_first",
            Self::DischargeFirst => "discharge_first",
        }
    }

    /// Maps a half-cycle index to its full-cycle number and phase.
    ///
    /// Half cycles `2k` and `2k + 1` both belong to full cycle `k + 1`.
    #[must_use]
    pub const fn classify(self, half_cycle_index: u32) -> CycleSlot {
        let even = half_cycle_index % 2 == 0;
        let phase = match (self, even) {
            (Self::ChargeFirst, true) | (Self::DischargeFirst, false) => Phase::Charge,
            (Self::ChargeFirst, false) | (Self::DischargeFirst, true) => Phase::Discharge,
        };
        CycleSlot {
            cycle_number: half_cycle_index / 2 + 1,
            phase,
        }
    }
}

impl fmt::Display for PhaseConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge_first" | "charge-first" => Ok(Self::ChargeFirst),
            "discharge_first" | "discharge-first" => Ok(Self::DischargeFirst),
            _ => Err(format!("invalid phase convention: {s}")),
        }
    }
}

/// Position of a half cycle within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleSlot {
    /// One-based full-cycle number.
    pub cycle_number: u32,
    pub phase: Phase,
}

/// Classifies a half-cycle index with the default charge-first convention.
#[must_use]
pub const fn classify(half_cycle_index: u32) -> CycleSlot {
    PhaseConvention::ChargeFirst.classify(half_cycle_index)
}
