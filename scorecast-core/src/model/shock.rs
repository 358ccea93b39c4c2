//! C5b: late market shock detection, comparing opening and closing odds to
//! flag fixtures where the market moved sharply and possibly against what
//! the model expects.

use crate::domain::{Distribution, Fixture, LateShock, Pick};

/// Minimum total-variation drift between opening and closing implied
/// probabilities before a fixture is considered to have shocked.
const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;

fn total_variation(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs() + (a.2 - b.2).abs()) / 2.0
}

fn implied_argmax(probs: (f64, f64, f64)) -> Pick {
    if probs.0 >= probs.1 && probs.0 >= probs.2 {
        Pick::Home
    } else if probs.1 >= probs.2 {
        Pick::Draw
    } else {
        Pick::Away
    }
}

/// Flags a fixture as shocked when its opening-to-closing odds drift exceeds
/// `drift_threshold`, recording whether the market's new favorite disagrees
/// with the model's prediction.
pub fn detect_late_shock(fixture: &Fixture, dist: &Distribution, drift_threshold: f64) -> LateShock {
    let (Some(opening), Some(closing)) = (fixture.opening_odds, fixture.closing_odds) else {
        return LateShock::none();
    };

    let opening_implied = opening.implied_probs();
    let closing_implied = closing.implied_probs();
    let drift = total_variation(opening_implied, closing_implied);

    if drift < drift_threshold {
        return LateShock::none();
    }

    let mut reasons = vec![format!("odds drift {drift:.3} exceeds threshold {drift_threshold:.3}")];
    let market_pick = implied_argmax(closing_implied);
    if market_pick != dist.argmax() {
        reasons.push(format!(
            "market favors {market_pick} after the move, model favors {}",
            dist.argmax()
        ));
    }

    LateShock {
        triggered: true,
        score: drift,
        reasons,
    }
}

/// Detects shocks for a full fixture slate using the default drift
/// threshold.
pub fn detect_late_shocks(fixtures: &[Fixture], distributions: &[Distribution]) -> Vec<LateShock> {
    fixtures
        .iter()
        .zip(distributions)
        .map(|(fixture, dist)| detect_late_shock(fixture, dist, DEFAULT_DRIFT_THRESHOLD))
        .collect()
}
