//! Decoded instrument records.

use serde::{Deserialize, Serialize};

/// One sampled timestep from a cycling run.
///
/// Records are expected in acquisition order; `elapsed_seconds` is assumed to be
/// non-decreasing and is not re-validated here. Field aliases accept the column
/// names used by EC-Lab exports, so a decoder can emit its rows unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Seconds since acquisition started.
    #[serde(alias = "time/s")]
    pub elapsed_seconds: f64,

    /// Working electrode potential in volts.
    #[serde(alias = "Ewe/V")]
    pub voltage: f64,

    /// Charge passed within the current half cycle (mA·h). The sign encodes
    /// direction, the magnitude is a running accumulator.
    #[serde(alias = "Q charge/discharge/mA.h")]
    pub charge_discharge_quantity: f64,

    /// Half-cycle counter, incremented at each charge/discharge transition.
    #[serde(alias = "half cycle")]
    pub half_cycle_index: u32,
}

impl Measurement {
    /// Creates a record from its four decoded fields.
    pub const fn new(
        elapsed_seconds: f64,
        voltage: f64,
        charge_discharge_quantity: f64,
        half_cycle_index: u32,
    ) -> Self {
        Self {
            elapsed_seconds,
            voltage,
            charge_discharge_quantity,
            half_cycle_index,
        }
    }

    /// Magnitude of the accumulated quantity, independent of direction.
    pub fn abs_quantity(&self) -> f64 {
        self.charge_discharge_quantity.abs()
    }
}
