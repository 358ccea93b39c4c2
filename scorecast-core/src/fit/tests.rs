use chrono::NaiveDate;

use super::*;
use crate::domain::error::ScorecastError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_matches() -> Vec<Match> {
    let teams = ["Alpha", "Bravo", "Charlie", "Delta"];
    let mut matches = Vec::new();
    let mut day = date(2024, 8, 1);
    for round in 0..20 {
        for pair in [(0, 1), (2, 3), (1, 2), (3, 0)] {
            let (home_goals, away_goals) = match (round + pair.0) % 3 {
                0 => (2, 0),
                1 => (1, 1),
                _ => (0, 1),
            };
            matches.push(Match {
                league: "TEST".into(),
                date: day,
                home_id: teams[pair.0].into(),
                away_id: teams[pair.1].into(),
                home_goals,
                away_goals,
                closing_odds: None,
            });
        }
        day += chrono::Duration::days(7);
    }
    matches
}

#[test]
fn fit_rejects_empty_input() {
    let err = fit(&[], &FitConfig::default()).unwrap_err();
    assert!(matches!(err, ScorecastError::Degenerate(_)));
}

#[test]
fn fit_rejects_single_team() {
    let matches = vec![Match {
        league: "TEST".into(),
        date: date(2024, 1, 1),
        home_id: "Alpha".into(),
        away_id: "Alpha".into(),
        home_goals: 1,
        away_goals: 1,
        closing_odds: None,
    }];
    let err = fit(&matches, &FitConfig::default()).unwrap_err();
    assert!(matches!(err, ScorecastError::Degenerate(_)));
}

#[test]
fn fit_converges_and_produces_bounded_rho() {
    let matches = sample_matches();
    let (artifact, metrics, _warnings) = fit(&matches, &FitConfig::default()).unwrap();

    assert!(artifact.rho >= RHO_LOWER_BOUND && artifact.rho <= RHO_UPPER_BOUND);
    assert!(artifact.home_advantage >= HOME_ADVANTAGE_LOWER_BOUND);
    assert!(artifact.home_advantage <= HOME_ADVANTAGE_UPPER_BOUND);
    assert!(artifact.metadata.iterations > 0);
    assert!(metrics.holdout_matches > 0);
    assert!(metrics.brier_score >= 0.0);
    assert!(metrics.categorical_accuracy >= 0.0 && metrics.categorical_accuracy <= 1.0);
}

#[test]
fn weight_decays_with_elapsed_time() {
    let reference = date(2024, 1, 100);
    let recent = weight_of(date(2024, 1, 99), reference, 0.01);
    let old = weight_of(date(2023, 1, 1), reference, 0.01);
    assert!(recent > old);
}

#[test]
fn time_ordered_split_preserves_causality() {
    let matches = sample_matches();
    let (training, holdout) = time_ordered_split(matches.clone(), 0.2);
    assert_eq!(matches.len(), training.len() + holdout.len());
    let max_training_date = training.iter().map(|m| m.date).max().unwrap();
    let min_holdout_date = holdout.iter().map(|m| m.date).min().unwrap();
    assert!(max_training_date <= min_holdout_date);
}

#[test]
fn dixon_coles_tau_matches_known_points() {
    assert_eq!(1.0 - 0.13, dixon_coles_tau(0, 1, 1.0, 1.0, -0.13));
    assert_eq!(1.0, dixon_coles_tau(3, 3, 1.0, 1.0, -0.13));
}
