//! C1: the Dixon-Coles Poisson scoring kernel.
//!
//! Given team strengths, home advantage and the low-score dependency
//! parameter rho, derives the full score matrix and the 1x2 distribution
//! for a single fixture.

use scorecast_num::factorial::{Factorial, Lookup};
use scorecast_num::linear::matrix::Matrix;
use scorecast_num::poisson;
use scorecast_num::probs::SliceExt;

use crate::domain::Distribution;
use crate::domain::error::{InvalidInput, NonFiniteAssertion, ScorecastError};

const DEFAULT_MAX_GOALS: usize = 10;
const HIGH_RATE_THRESHOLD: f64 = 6.0;
const TAIL_PROBABILITY_BOUND: f64 = 1e-6;
const MAX_GOALS_CEILING: usize = 34;
const CELL_FLOOR: f64 = 1e-12;
const ENTROPY_BASE: f64 = 3.0;

/// Dixon-Coles low-score correction factor.
fn tau(i: usize, j: usize, lambda_home: f64, lambda_away: f64, rho: f64) -> f64 {
    match (i, j) {
        (0, 0) => 1.0 - lambda_home * lambda_away * rho,
        (0, 1) => 1.0 + lambda_home * rho,
        (1, 0) => 1.0 + lambda_away * rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

/// Smallest `K` such that the Poisson tail beyond `K` is below
/// [`TAIL_PROBABILITY_BOUND`] for both scoring rates.
fn resolve_max_goals(lambda_home: f64, lambda_away: f64, requested: Option<usize>) -> usize {
    let mut max_goals = requested.unwrap_or(DEFAULT_MAX_GOALS);
    if lambda_home <= HIGH_RATE_THRESHOLD && lambda_away <= HIGH_RATE_THRESHOLD {
        return max_goals;
    }
    let factorial = Lookup::default();
    loop {
        if max_goals >= MAX_GOALS_CEILING {
            return max_goals;
        }
        let home_tail: f64 = (0..=max_goals)
            .map(|k| poisson::univariate(k as u8, lambda_home, &factorial))
            .sum::<f64>();
        let away_tail: f64 = (0..=max_goals)
            .map(|k| poisson::univariate(k as u8, lambda_away, &factorial))
            .sum::<f64>();
        if 1.0 - home_tail < TAIL_PROBABILITY_BOUND && 1.0 - away_tail < TAIL_PROBABILITY_BOUND {
            return max_goals;
        }
        max_goals += 5;
    }
}

/// Builds the full Dixon-Coles score matrix, normalized to sum to 1.
pub fn score_matrix(
    lambda_home: f64,
    lambda_away: f64,
    rho: f64,
    max_goals: Option<usize>,
) -> Matrix<f64> {
    let max_goals = resolve_max_goals(lambda_home, lambda_away, max_goals);
    let dim = max_goals + 1;
    let factorial = Lookup::default();
    let mut grid = Matrix::allocate(dim, dim);
    for home_goals in 0..dim {
        for away_goals in 0..dim {
            let home_prob = poisson::univariate(home_goals as u8, lambda_home, &factorial);
            let away_prob = poisson::univariate(away_goals as u8, lambda_away, &factorial);
            let correction = tau(home_goals, away_goals, lambda_home, lambda_away, rho);
            let cell = (home_prob * away_prob * correction).max(CELL_FLOOR);
            grid[(home_goals, away_goals)] = cell;
        }
    }
    grid.flatten_mut().normalise(1.0);
    grid
}

/// Sums a score matrix into a 1x2 probability triple: home win, draw, away win.
pub fn gather_1x2(grid: &Matrix<f64>) -> (f64, f64, f64) {
    let (mut p_home, mut p_draw, mut p_away) = (0.0, 0.0, 0.0);
    for home_goals in 0..grid.rows() {
        for away_goals in 0..grid.cols() {
            let cell = grid[(home_goals, away_goals)];
            match home_goals.cmp(&away_goals) {
                std::cmp::Ordering::Greater => p_home += cell,
                std::cmp::Ordering::Equal => p_draw += cell,
                std::cmp::Ordering::Less => p_away += cell,
            }
        }
    }
    (p_home, p_draw, p_away)
}

/// Normalized Shannon entropy of a categorical triple, in `[0, 1]`.
pub fn normalized_entropy(probs: [f64; 3]) -> f64 {
    let nats: f64 = probs
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum();
    nats / ENTROPY_BASE.ln()
}

/// Computes the full Dixon-Coles distribution for one fixture.
///
/// Fails with [`ScorecastError::InvalidInput`] if any input is non-finite.
pub fn predict_distribution(
    home_attack: f64,
    home_defense: f64,
    away_attack: f64,
    away_defense: f64,
    home_advantage: f64,
    rho: f64,
    max_goals: Option<usize>,
) -> Result<Distribution, ScorecastError> {
    for (field, value) in [
        ("home_attack", home_attack),
        ("home_defense", home_defense),
        ("away_attack", away_attack),
        ("away_defense", away_defense),
        ("home_advantage", home_advantage),
        ("rho", rho),
    ] {
        NonFiniteAssertion::check(field, value).map_err(InvalidInput::from)?;
    }

    let lambda_home = (home_attack - away_defense + home_advantage).exp();
    let lambda_away = (away_attack - home_defense).exp();
    NonFiniteAssertion::check("lambda_home", lambda_home).map_err(InvalidInput::from)?;
    NonFiniteAssertion::check("lambda_away", lambda_away).map_err(InvalidInput::from)?;

    let grid = score_matrix(lambda_home, lambda_away, rho, max_goals);
    let (p_home, p_draw, p_away) = gather_1x2(&grid);
    let entropy = normalized_entropy([p_home, p_draw, p_away]);

    Ok(Distribution {
        p_home,
        p_draw,
        p_away,
        lambda_home,
        lambda_away,
        entropy,
    })
}

#[cfg(test)]
mod tests;
