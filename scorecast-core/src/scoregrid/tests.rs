use assert_float_eq::*;

use super::*;

#[test]
fn tau_corrections_at_low_scores() {
    assert_f64_near!(1.13, tau(0, 0, 1.0, 1.0, -0.13));
    assert_f64_near!(1.0 - 0.13, tau(0, 1, 1.0, 1.0, -0.13));
    assert_f64_near!(1.0 - 0.13, tau(1, 0, 1.0, 1.0, -0.13));
    assert_f64_near!(1.13, tau(1, 1, 1.0, 1.0, -0.13));
    assert_eq!(1.0, tau(2, 2, 1.0, 1.0, -0.13));
}

#[test]
fn tau_identity_when_rho_zero() {
    for (i, j) in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 3)] {
        assert_eq!(1.0, tau(i, j, 1.4, 0.9, 0.0));
    }
}

#[test]
fn score_matrix_sums_to_one() {
    let grid = score_matrix(1.419, 0.819, -0.13, Some(10));
    let total: f64 = grid.flatten().iter().sum();
    assert_f64_near!(1.0, total, 20);
}

#[test]
fn resolve_max_goals_grows_for_high_rates() {
    let default_k = resolve_max_goals(1.0, 1.0, Some(10));
    assert_eq!(10, default_k);

    let grown_k = resolve_max_goals(8.0, 8.0, Some(10));
    assert!(grown_k > 10);
}

#[test]
fn symmetric_strengths_yield_even_split() {
    let dist = predict_distribution(1.0, 1.0, 1.0, 1.0, 0.0, -0.13, None).unwrap();
    assert_float_relative_eq!(dist.p_home, dist.p_away, 1e-9);
}

#[test]
fn home_favourite_scenario_matches_expected_band() {
    // a_h=1.1, d_h=0.9, a_a=0.9, d_a=1.1, h=0.35: lambda_home = exp(a_h - d_a + h)
    // = exp(0.35) ~= 1.419, lambda_away = exp(a_a - d_h) = exp(0.0) = 1.0.
    let dist = predict_distribution(1.1, 0.9, 0.9, 1.1, 0.35, -0.13, Some(10)).unwrap();
    assert_float_relative_eq!(dist.lambda_home, 1.419, 0.01);
    assert_float_relative_eq!(dist.lambda_away, 1.0, 0.01);
    assert!(dist.p_home > dist.p_away);
    assert!(dist.p_draw >= 0.20 && dist.p_draw <= 0.32);
}

#[test]
fn distribution_probabilities_sum_to_one() {
    let dist = predict_distribution(1.1, 0.9, 0.9, 1.1, 0.35, -0.13, Some(10)).unwrap();
    let sum = dist.p_home + dist.p_draw + dist.p_away;
    assert_float_relative_eq!(sum, 1.0, 1e-6);
}

#[test]
fn entropy_is_normalised_into_unit_interval() {
    let dist = predict_distribution(1.1, 0.9, 0.9, 1.1, 0.35, -0.13, Some(10)).unwrap();
    assert!(dist.entropy >= 0.0 && dist.entropy <= 1.0);
}

#[test]
fn entropy_is_maximal_for_a_uniform_triple() {
    let uniform = normalized_entropy([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
    assert_float_relative_eq!(uniform, 1.0, 1e-9);
}

#[test]
fn entropy_is_zero_for_a_degenerate_triple() {
    let degenerate = normalized_entropy([1.0, 0.0, 0.0]);
    assert_eq!(0.0, degenerate);
}

#[test]
fn non_finite_input_is_rejected() {
    let err = predict_distribution(f64::NAN, 0.9, 0.9, 1.1, 0.35, -0.13, None).unwrap_err();
    assert!(matches!(err, ScorecastError::InvalidInput(_)));
}
