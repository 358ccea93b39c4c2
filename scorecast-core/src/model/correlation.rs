//! C5a: pairwise fixture correlation used to detect over-concentrated
//! ticket picks before they're committed.

use scorecast_num::linear::matrix::Matrix;

use crate::domain::{Distribution, Fixture};

/// Weights applied to each similarity signal when blending them into a
/// single pairwise correlation estimate. Exposed per-league since the
/// relative importance of kickoff clustering vs. scoring-regime similarity
/// varies with fixture congestion conventions.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationWeights {
    pub kickoff_proximity: f64,
    pub same_league: f64,
    pub regime_similarity: f64,
    pub draw_similarity: f64,
}

impl Default for CorrelationWeights {
    fn default() -> Self {
        Self {
            kickoff_proximity: 0.3,
            same_league: 0.2,
            regime_similarity: 0.25,
            draw_similarity: 0.25,
        }
    }
}

/// The correlation-break threshold above which two fixtures are treated as
/// too similar to carry the same pick unhedged. Exposed per-league.
pub const DEFAULT_CORRELATION_BREAK_THRESHOLD: f64 = 0.7;

fn kickoff_proximity(a: &Fixture, b: &Fixture) -> f64 {
    match (a.kickoff, b.kickoff) {
        (Some(a_time), Some(b_time)) => {
            let hours = (a_time - b_time).num_minutes().abs() as f64 / 60.0;
            (-hours / 6.0).exp()
        }
        _ => 0.0,
    }
}

fn regime_similarity(a: &Distribution, b: &Distribution) -> f64 {
    let total_a = a.lambda_home + a.lambda_away;
    let total_b = b.lambda_home + b.lambda_away;
    1.0 / (1.0 + (total_a - total_b).abs())
}

fn draw_similarity(a: &Distribution, b: &Distribution) -> f64 {
    1.0 - (a.p_draw - b.p_draw).abs()
}

/// Builds a symmetric `n x n` correlation matrix across `fixtures`, using
/// their paired [`Distribution`]s for the regime/draw similarity signals.
/// The diagonal is always 1.
pub fn build_correlation_matrix(
    fixtures: &[Fixture],
    distributions: &[Distribution],
    weights: CorrelationWeights,
) -> Matrix<f64> {
    let n = fixtures.len();
    let mut matrix = Matrix::allocate(n, n);
    for i in 0..n {
        matrix[(i, i)] = 1.0;
        for j in (i + 1)..n {
            let same_league = if fixtures[i].league == fixtures[j].league {
                1.0
            } else {
                0.0
            };
            let correlation = weights.kickoff_proximity * kickoff_proximity(&fixtures[i], &fixtures[j])
                + weights.same_league * same_league
                + weights.regime_similarity * regime_similarity(&distributions[i], &distributions[j])
                + weights.draw_similarity * draw_similarity(&distributions[i], &distributions[j]);
            let correlation = correlation.clamp(-1.0, 1.0);
            matrix[(i, j)] = correlation;
            matrix[(j, i)] = correlation;
        }
    }
    matrix
}
