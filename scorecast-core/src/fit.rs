//! C2: the rating estimator. Fits attack/defense strengths, home advantage
//! and the Dixon-Coles dependency parameter rho from historical matches via
//! iterative proportional fitting, then validates the result on a
//! time-ordered holdout split.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use scorecast_num::opt::{univariate_descent, UnivariateDescentConfig};
use tracing::debug;

use crate::domain::error::{
    Degenerate, EmptyInputAssertion, InsufficientTeamsAssertion, ScorecastError, Warning,
};
use crate::domain::{FitArtifact, FitMetadata, Match, Pick, TeamId};
use crate::scoregrid;

const DEFAULT_MAX_ITERATIONS: u32 = 200;
const DEFAULT_CONVERGENCE_TOLERANCE: f64 = 1e-6;
/// Stabilizer added to goal counts before taking logs when re-estimating
/// home advantage, so that 0-0 and 0-1 results don't blow up the residual.
const DEFAULT_ZERO_GOAL_STABILIZER: f64 = 0.5;
const DEFAULT_XI: f64 = 0.0018;
const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;
const RHO_LOWER_BOUND: f64 = -0.2;
const RHO_UPPER_BOUND: f64 = 0.0;
const RHO_INIT: f64 = -0.1;
const HOME_ADVANTAGE_INIT: f64 = 0.25;
const HOME_ADVANTAGE_LOWER_BOUND: f64 = 0.1;
const HOME_ADVANTAGE_UPPER_BOUND: f64 = 0.6;
const TAU_FLOOR: f64 = 1e-10;
const UNCALIBRATED_WEIGHT_THRESHOLD: f64 = 2.0;
const PROB_FLOOR: f64 = 1e-12;

#[derive(Clone, Debug)]
pub struct FitConfig {
    /// Exponential time-decay rate applied to older matches.
    pub xi: f64,
    pub max_iterations: u32,
    pub convergence_tolerance: f64,
    pub zero_goal_stabilizer: f64,
    pub holdout_fraction: f64,
    /// Matches weighted relative to this date; defaults to the most recent
    /// match date in the supplied history.
    pub reference_date: Option<NaiveDate>,
    pub initial_home_advantage: f64,
    pub initial_rho: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            xi: DEFAULT_XI,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_tolerance: DEFAULT_CONVERGENCE_TOLERANCE,
            zero_goal_stabilizer: DEFAULT_ZERO_GOAL_STABILIZER,
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            reference_date: None,
            initial_home_advantage: HOME_ADVANTAGE_INIT,
            initial_rho: RHO_INIT,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitMetrics {
    pub brier_score: f64,
    pub log_loss: f64,
    pub categorical_accuracy: f64,
    pub draw_accuracy: f64,
    pub rmse: f64,
    pub holdout_matches: usize,
}

struct TeamAccumulator {
    attack: FxHashMap<TeamId, f64>,
    defense: FxHashMap<TeamId, f64>,
}

fn weight_of(date: NaiveDate, reference_date: NaiveDate, xi: f64) -> f64 {
    let days_elapsed = (reference_date - date).num_days().max(0) as f64;
    (-xi * days_elapsed).exp()
}

fn initialise_teams(matches: &[Match]) -> FxHashSet<TeamId> {
    let mut teams = FxHashSet::default();
    for m in matches {
        teams.insert(m.home_id.clone());
        teams.insert(m.away_id.clone());
    }
    teams
}

/// One coordinate-wise update pass over every team's attack and defense
/// parameters, holding all other parameters fixed (IPF / backfitting).
fn ipf_pass(
    matches: &[Match],
    weights: &[f64],
    teams: &FxHashSet<TeamId>,
    attack: &mut FxHashMap<TeamId, f64>,
    defense: &mut FxHashMap<TeamId, f64>,
    home_advantage: f64,
) -> f64 {
    let mut max_delta: f64 = 0.0;

    for team in teams {
        let mut observed = 0.0;
        let mut baseline = 0.0;
        for (m, &w) in matches.iter().zip(weights) {
            if &m.home_id == team {
                let d_away = defense[&m.away_id];
                observed += w * m.home_goals as f64;
                baseline += w * (-d_away + home_advantage).exp();
            } else if &m.away_id == team {
                let d_home = defense[&m.home_id];
                observed += w * m.away_goals as f64;
                baseline += w * (-d_home).exp();
            }
        }
        if baseline > 0.0 && observed > 0.0 {
            let new_attack = observed.ln() - baseline.ln();
            let delta = (new_attack - attack[team]).abs();
            max_delta = max_delta.max(delta);
            attack.insert(team.clone(), new_attack);
        }
    }

    for team in teams {
        let mut observed = 0.0;
        let mut baseline = 0.0;
        for (m, &w) in matches.iter().zip(weights) {
            if &m.home_id == team {
                let a_away = attack[&m.away_id];
                observed += w * m.away_goals as f64;
                baseline += w * a_away.exp();
            } else if &m.away_id == team {
                let a_home = attack[&m.home_id];
                observed += w * m.home_goals as f64;
                baseline += w * (a_home + home_advantage).exp();
            }
        }
        if baseline > 0.0 && observed > 0.0 {
            let new_defense = baseline.ln() - observed.ln();
            let delta = (new_defense - defense[team]).abs();
            max_delta = max_delta.max(delta);
            defense.insert(team.clone(), new_defense);
        }
    }

    // The log-additive rate exp(attack_home - defense_away + h) is invariant
    // under adding the same constant to every attack and every defense, so
    // the system is under-determined by the score equations alone. Anchor it
    // by centering each side on zero every pass, the log-space analogue of
    // the spec's "divide by mean" normalization.
    let n = teams.len() as f64;
    let mean_attack: f64 = teams.iter().map(|t| attack[t]).sum::<f64>() / n;
    let mean_defense: f64 = teams.iter().map(|t| defense[t]).sum::<f64>() / n;
    for team in teams {
        *attack.get_mut(team).unwrap() -= mean_attack;
        *defense.get_mut(team).unwrap() -= mean_defense;
    }

    max_delta
}

fn reestimate_home_advantage(
    matches: &[Match],
    weights: &[f64],
    attack: &FxHashMap<TeamId, f64>,
    defense: &FxHashMap<TeamId, f64>,
    stabilizer: f64,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (m, &w) in matches.iter().zip(weights) {
        let home_goals = if m.home_goals > 0 {
            m.home_goals as f64
        } else {
            stabilizer
        };
        let residual = home_goals.ln() - (attack[&m.home_id] - defense[&m.away_id]);
        weighted_sum += w * residual;
        weight_total += w;
    }
    if weight_total > 0.0 {
        (weighted_sum / weight_total).clamp(HOME_ADVANTAGE_LOWER_BOUND, HOME_ADVANTAGE_UPPER_BOUND)
    } else {
        HOME_ADVANTAGE_INIT
    }
}

fn fit_rho(
    matches: &[Match],
    weights: &[f64],
    attack: &FxHashMap<TeamId, f64>,
    defense: &FxHashMap<TeamId, f64>,
    home_advantage: f64,
    initial_rho: f64,
) -> (f64, bool) {
    let low_scoring: Vec<(&Match, f64)> = matches
        .iter()
        .zip(weights.iter().copied())
        .filter(|(m, _)| m.home_goals <= 1 && m.away_goals <= 1)
        .collect();

    if low_scoring.is_empty() {
        return (initial_rho.clamp(RHO_LOWER_BOUND, RHO_UPPER_BOUND), true);
    }

    let outcome = univariate_descent(
        &UnivariateDescentConfig {
            init_value: initial_rho,
            init_step: 0.02,
            min_step: 1e-6,
            max_steps: 200,
            acceptable_residual: 1e-9,
        },
        |value| {
            let rho = value.clamp(RHO_LOWER_BOUND, RHO_UPPER_BOUND);
            let mut neg_log_likelihood = 0.0;
            for (m, w) in &low_scoring {
                let lambda_home = (attack[&m.home_id] - defense[&m.away_id] + home_advantage).exp();
                let lambda_away = (attack[&m.away_id] - defense[&m.home_id]).exp();
                let tau = dixon_coles_tau(
                    m.home_goals as usize,
                    m.away_goals as usize,
                    lambda_home,
                    lambda_away,
                    rho,
                );
                neg_log_likelihood -= w * tau.max(TAU_FLOOR).ln();
            }
            neg_log_likelihood
        },
    );

    (outcome.optimal_value.clamp(RHO_LOWER_BOUND, RHO_UPPER_BOUND), false)
}

fn dixon_coles_tau(i: usize, j: usize, lambda_home: f64, lambda_away: f64, rho: f64) -> f64 {
    match (i, j) {
        (0, 0) => 1.0 - lambda_home * lambda_away * rho,
        (0, 1) => 1.0 + lambda_home * rho,
        (1, 0) => 1.0 + lambda_away * rho,
        (1, 1) => 1.0 - rho,
        _ => 1.0,
    }
}

fn time_ordered_split(mut matches: Vec<Match>, holdout_fraction: f64) -> (Vec<Match>, Vec<Match>) {
    matches.sort_by(|a, b| {
        (a.date, &a.home_id, &a.away_id).cmp(&(b.date, &b.home_id, &b.away_id))
    });
    let holdout_size = ((matches.len() as f64) * holdout_fraction).round() as usize;
    let holdout_size = holdout_size.min(matches.len().saturating_sub(1)).max(0);
    let split_at = matches.len() - holdout_size;
    let holdout = matches.split_off(split_at);
    (matches, holdout)
}

fn evaluate_holdout(
    holdout: &[Match],
    attack: &FxHashMap<TeamId, f64>,
    defense: &FxHashMap<TeamId, f64>,
    home_advantage: f64,
    rho: f64,
) -> FitMetrics {
    if holdout.is_empty() {
        return FitMetrics::default();
    }

    let (mut brier_sum, mut log_loss_sum, mut correct, mut se_sum) = (0.0, 0.0, 0.0, 0.0);
    let (mut draw_actual, mut draw_correct) = (0usize, 0usize);

    for m in holdout {
        let a_h = attack.get(&m.home_id).copied().unwrap_or(0.0);
        let d_h = defense.get(&m.home_id).copied().unwrap_or(0.0);
        let a_a = attack.get(&m.away_id).copied().unwrap_or(0.0);
        let d_a = defense.get(&m.away_id).copied().unwrap_or(0.0);

        let Ok(dist) =
            scoregrid::predict_distribution(a_h, d_h, a_a, d_a, home_advantage, rho, None)
        else {
            continue;
        };

        let actual = match m.home_goals.cmp(&m.away_goals) {
            std::cmp::Ordering::Greater => Pick::Home,
            std::cmp::Ordering::Equal => Pick::Draw,
            std::cmp::Ordering::Less => Pick::Away,
        };
        let one_hot = [
            if actual == Pick::Home { 1.0 } else { 0.0 },
            if actual == Pick::Draw { 1.0 } else { 0.0 },
            if actual == Pick::Away { 1.0 } else { 0.0 },
        ];
        let triple = dist.as_triple();

        brier_sum += triple
            .iter()
            .zip(one_hot.iter())
            .map(|(p, y)| (p - y).powi(2))
            .sum::<f64>();
        log_loss_sum -= dist.prob_of(actual).max(PROB_FLOOR).ln();
        if dist.argmax() == actual {
            correct += 1.0;
        }
        if actual == Pick::Draw {
            draw_actual += 1;
            if dist.argmax() == Pick::Draw {
                draw_correct += 1;
            }
        }
        se_sum += (dist.lambda_home - m.home_goals as f64).powi(2)
            + (dist.lambda_away - m.away_goals as f64).powi(2);
    }

    let n = holdout.len() as f64;
    FitMetrics {
        brier_score: brier_sum / n,
        log_loss: log_loss_sum / n,
        categorical_accuracy: correct / n,
        draw_accuracy: if draw_actual > 0 {
            draw_correct as f64 / draw_actual as f64
        } else {
            0.0
        },
        rmse: (se_sum / (2.0 * n)).sqrt(),
        holdout_matches: holdout.len(),
    }
}

/// Fits team strengths, home advantage and rho from historical matches.
///
/// Fails with [`ScorecastError::Degenerate`] if no matches are supplied, or
/// fewer than two distinct teams appear across them.
pub fn fit(
    matches: &[Match],
    config: &FitConfig,
) -> Result<(FitArtifact, FitMetrics, Vec<Warning>), ScorecastError> {
    EmptyInputAssertion::check(matches.len()).map_err(Degenerate::from)?;

    let teams = initialise_teams(matches);
    InsufficientTeamsAssertion::check(teams.len()).map_err(Degenerate::from)?;

    let mut warnings = Vec::new();
    let reference_date = config
        .reference_date
        .unwrap_or_else(|| matches.iter().map(|m| m.date).max().unwrap());

    let (training, holdout) = time_ordered_split(matches.to_vec(), config.holdout_fraction);
    let weights: Vec<f64> = training
        .iter()
        .map(|m| weight_of(m.date, reference_date, config.xi))
        .collect();

    let mut attack: FxHashMap<TeamId, f64> = teams.iter().map(|t| (t.clone(), 0.0)).collect();
    let mut defense: FxHashMap<TeamId, f64> = teams.iter().map(|t| (t.clone(), 0.0)).collect();
    let mut home_advantage = config.initial_home_advantage;

    let mut iterations = 0;
    let mut max_delta = f64::INFINITY;
    while iterations < config.max_iterations && max_delta > config.convergence_tolerance {
        let param_delta = ipf_pass(
            &training,
            &weights,
            &teams,
            &mut attack,
            &mut defense,
            home_advantage,
        );
        let new_home_advantage = reestimate_home_advantage(
            &training,
            &weights,
            &attack,
            &defense,
            config.zero_goal_stabilizer,
        );
        max_delta = param_delta.max((new_home_advantage - home_advantage).abs());
        home_advantage = new_home_advantage;
        iterations += 1;
        debug!(iterations, max_delta, home_advantage, "ipf pass complete");
    }

    let (rho, rho_fallback) = fit_rho(
        &training,
        &weights,
        &attack,
        &defense,
        home_advantage,
        config.initial_rho,
    );
    if rho_fallback {
        warnings.push(Warning::NumericalInstability {
            context: "rho".to_string(),
            detail: "no low-scoring training matches; fell back to initial rho".to_string(),
        });
    }

    let mut weighted_appearances: FxHashMap<TeamId, f64> = FxHashMap::default();
    for (m, &w) in training.iter().zip(&weights) {
        *weighted_appearances.entry(m.home_id.clone()).or_default() += w;
        *weighted_appearances.entry(m.away_id.clone()).or_default() += w;
    }
    let mut uncalibrated_teams: Vec<TeamId> = teams
        .iter()
        .filter(|t| weighted_appearances.get(*t).copied().unwrap_or(0.0) < UNCALIBRATED_WEIGHT_THRESHOLD)
        .cloned()
        .collect();
    uncalibrated_teams.sort();
    for team in &uncalibrated_teams {
        warnings.push(Warning::UncalibratedTeam {
            team: team.0.clone(),
        });
    }

    let metrics = evaluate_holdout(&holdout, &attack, &defense, home_advantage, rho);

    let artifact = FitArtifact {
        attack,
        defense,
        home_advantage,
        rho,
        reference_date,
        xi: config.xi,
        metadata: FitMetadata {
            iterations,
            max_delta,
            rho_fallback,
            normalization: "post_iteration_mean",
            uncalibrated_teams,
        },
    };

    Ok((artifact, metrics, warnings))
}

#[cfg(test)]
mod tests;
