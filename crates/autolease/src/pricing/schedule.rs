use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Residual percentage used when a term is not listed in a schedule.
pub const DEFAULT_RESIDUAL_PERCENT: f64 = 57.0;

const STANDARD_RESIDUALS: [(u16, f64); 4] = [(24, 64.0), (36, 57.0), (39, 55.0), (48, 50.0)];

const STANDARD_MILEAGE_ADJUSTMENTS: [(u32, f64); 4] = [
    (7_500, -0.000_05),
    (10_000, 0.0),
    (12_000, 0.000_05),
    (15_000, 0.000_1),
];

fn default_residual_percent() -> f64 {
    DEFAULT_RESIDUAL_PERCENT
}

/// Term (months) to residual percentage of MSRP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualSchedule {
    pub percents: BTreeMap<u16, f64>,
    #[serde(default = "default_residual_percent")]
    pub default_percent: f64,
}

impl ResidualSchedule {
    pub fn standard() -> Self {
        Self {
            percents: STANDARD_RESIDUALS.into_iter().collect(),
            default_percent: DEFAULT_RESIDUAL_PERCENT,
        }
    }

    /// Unlisted terms fall back to the schedule default instead of failing.
    pub fn residual_percent(&self, term_months: u16) -> f64 {
        self.percents
            .get(&term_months)
            .copied()
            .unwrap_or(self.default_percent)
    }

    pub fn terms(&self) -> Vec<u16> {
        self.percents.keys().copied().collect()
    }
}

impl Default for ResidualSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

/// Annual mileage allowance to signed money-factor offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageAdjustments {
    pub offsets: BTreeMap<u32, f64>,
}

impl MileageAdjustments {
    pub fn standard() -> Self {
        Self {
            offsets: STANDARD_MILEAGE_ADJUSTMENTS.into_iter().collect(),
        }
    }

    /// Unlisted mileage tiers carry no adjustment.
    pub fn adjustment(&self, annual_mileage: u32) -> f64 {
        self.offsets.get(&annual_mileage).copied().unwrap_or(0.0)
    }

    pub fn tiers(&self) -> Vec<u32> {
        self.offsets.keys().copied().collect()
    }
}

impl Default for MileageAdjustments {
    fn default() -> Self {
        Self::standard()
    }
}

/// Residual percentage from the standard schedule.
pub fn residual_percent(term_months: u16) -> f64 {
    ResidualSchedule::standard().residual_percent(term_months)
}

/// Money-factor offset from the standard mileage tiers.
pub fn mileage_adjustment(annual_mileage: u32) -> f64 {
    MileageAdjustments::standard().adjustment(annual_mileage)
}
