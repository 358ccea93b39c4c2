//! Dixon-Coles fitting, scoring and jackpot ticket generation.
//!
//! The three external entry points are [`fit::fit`], [`predict_fixture`]
//! and [`model::ticket_generator::generate_bundle`]; they are re-exported at
//! the crate root as [`fit`] and [`generate_bundle`].

pub mod domain;
pub mod fit;
pub mod model;
pub mod print;
pub mod scoregrid;

use domain::error::ScorecastError;
use domain::{Distribution, FitArtifact, Fixture, League};
use model::calibration::CalibrationTable;
use model::draw_adjuster;

pub use fit::fit;
pub use model::ticket_generator::generate_bundle;
pub use scoregrid::predict_distribution as predict;

/// Predicts the final 1x2 distribution for one upcoming `fixture`: the raw
/// Dixon-Coles kernel (C1), structurally adjusted for the draw (C3), then
/// optionally calibrated per league (C4).
///
/// `league` supplies the structural inputs for the league-prior draw
/// component; absent it (or any other component's required input), that
/// component is neutral. Fails with [`ScorecastError`] if any team
/// strength is non-finite or the intermediate distribution doesn't sum to
/// one within tolerance.
pub fn predict_fixture(
    fixture: &Fixture,
    artifact: &FitArtifact,
    league: Option<&League>,
    calibration: Option<&CalibrationTable>,
) -> Result<Distribution, ScorecastError> {
    let base = predict(
        artifact.attack_of(&fixture.home_id),
        artifact.defense_of(&fixture.home_id),
        artifact.attack_of(&fixture.away_id),
        artifact.defense_of(&fixture.away_id),
        artifact.home_advantage,
        artifact.rho,
        None,
    )?;

    let components = draw_adjuster::compute_draw_components(fixture, league);
    let adjusted = draw_adjuster::adjust_draw_probability(&base, &components)?;

    Ok(match calibration {
        Some(table) => model::calibration::apply_calibration(&adjusted, table),
        None => adjusted,
    })
}
