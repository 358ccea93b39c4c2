//! C4: optional per-league probability calibration.
//!
//! A [`CalibrationTable`] holds one monotonic step function per outcome,
//! fitted offline (isotonic regression or Platt scaling) and supplied here
//! purely for application at prediction time.

use serde::{Deserialize, Serialize};

use crate::domain::Distribution;
use crate::scoregrid::normalized_entropy;

/// One calibration step: raw probabilities at or above `lower_bound` map to
/// `calibrated`. Bins must be supplied sorted ascending by `lower_bound`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub lower_bound: f64,
    pub calibrated: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalibrationTable {
    pub home: Vec<CalibrationBin>,
    pub draw: Vec<CalibrationBin>,
    pub away: Vec<CalibrationBin>,
}

fn calibrate_one(raw: f64, bins: &[CalibrationBin]) -> f64 {
    bins.iter()
        .rev()
        .find(|bin| raw >= bin.lower_bound)
        .map(|bin| bin.calibrated)
        .unwrap_or(raw)
}

/// Applies a calibration table to a distribution, then renormalizes the
/// three outcomes back to a sum of 1.
pub fn apply_calibration(dist: &Distribution, table: &CalibrationTable) -> Distribution {
    let mut home = calibrate_one(dist.p_home, &table.home);
    let mut draw = calibrate_one(dist.p_draw, &table.draw);
    let mut away = calibrate_one(dist.p_away, &table.away);

    let total = home + draw + away;
    if total > 0.0 {
        home /= total;
        draw /= total;
        away /= total;
    }

    Distribution {
        p_home: home,
        p_draw: draw,
        p_away: away,
        lambda_home: dist.lambda_home,
        lambda_away: dist.lambda_away,
        entropy: normalized_entropy([home, draw, away]),
    }
}
