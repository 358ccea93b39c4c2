//! C3: structural adjustment of the draw probability by eight bounded
//! multiplicative components, with proportional home/away renormalization.

use crate::domain::error::{DistributionSumAssertion, InvalidDistribution, ScorecastError};
use crate::domain::{Distribution, DrawComponents, Fixture, League};
use crate::scoregrid::normalized_entropy;

const DRAW_PROBABILITY_FLOOR: f64 = 0.12;
const DRAW_PROBABILITY_CEILING: f64 = 0.38;

const LEAGUE_PRIOR_BASE_CLIP: (f64, f64) = (0.9, 1.2);
const LEAGUE_STRUCTURE_CLIP: (f64, f64) = (0.95, 1.05);
const LEAGUE_PRIOR_CLIP: (f64, f64) = (0.9, 1.2);
const ELO_SYMMETRY_CLIP: (f64, f64) = (0.8, 1.2);
const HEAD_TO_HEAD_CLIP: (f64, f64) = (0.9, 1.15);
const WEATHER_CLIP: (f64, f64) = (0.95, 1.10);
const FATIGUE_CLIP: (f64, f64) = (0.9, 1.12);
const REFEREE_CLIP: (f64, f64) = (0.95, 1.10);
const ODDS_DRIFT_CLIP: (f64, f64) = (0.9, 1.15);
const XG_CLIP: (f64, f64) = (0.8, 1.2);

const LEAGUE_PRIOR_DIVISOR: f64 = 0.26;
const LEAGUE_STRUCTURE_TEAM_COUNT_BASELINE: f64 = 20.0;
const LEAGUE_STRUCTURE_TEAM_COUNT_SCALE: f64 = 0.005;
const LEAGUE_STRUCTURE_RELEGATION_SCALE: f64 = 0.02;
const ELO_SYMMETRY_SCALE: f64 = 160.0;
const HEAD_TO_HEAD_DIVISOR: f64 = 0.26;
const HEAD_TO_HEAD_MIN_MATCHES: u32 = 4;
const FATIGUE_TARGET_REST_DAYS: f64 = 4.0;
const FATIGUE_SCALE: f64 = 0.04;
const REFEREE_SCALE: f64 = 0.08;
const ODDS_DRIFT_SCALE: f64 = 0.15;

/// Builds the eight structural [`DrawComponents`] for `fixture`. Any
/// component whose required input is absent (or, for the league prior,
/// whose `league` is `None`) falls back to the neutral `1.0`.
pub fn compute_draw_components(fixture: &Fixture, league: Option<&League>) -> DrawComponents {
    DrawComponents {
        league_prior: league_prior_component(league),
        elo_symmetry: elo_symmetry_component(fixture),
        head_to_head: head_to_head_component(fixture),
        weather: passthrough_component(fixture.weather_draw_index, WEATHER_CLIP),
        fatigue: fatigue_component(fixture),
        referee: referee_component(fixture),
        odds_drift: odds_drift_component(fixture),
        xg: passthrough_component(fixture.xg_draw_index, XG_CLIP),
    }
}

fn passthrough_component(value: Option<f64>, clip: (f64, f64)) -> f64 {
    value.map(|v| v.clamp(clip.0, clip.1)).unwrap_or(1.0)
}

fn league_prior_component(league: Option<&League>) -> f64 {
    let Some(league) = league else {
        return 1.0;
    };
    let base = (league.baseline_draw_rate / LEAGUE_PRIOR_DIVISOR)
        .clamp(LEAGUE_PRIOR_BASE_CLIP.0, LEAGUE_PRIOR_BASE_CLIP.1);
    let team_count_term = 1.0
        + (league.team_count as f64 - LEAGUE_STRUCTURE_TEAM_COUNT_BASELINE)
            * LEAGUE_STRUCTURE_TEAM_COUNT_SCALE;
    let relegation_term =
        1.0 + (league.relegation_zone_count as f64 / 3.0) * LEAGUE_STRUCTURE_RELEGATION_SCALE;
    let structure =
        (team_count_term * relegation_term).clamp(LEAGUE_STRUCTURE_CLIP.0, LEAGUE_STRUCTURE_CLIP.1);
    (base * structure).clamp(LEAGUE_PRIOR_CLIP.0, LEAGUE_PRIOR_CLIP.1)
}

fn elo_symmetry_component(fixture: &Fixture) -> f64 {
    match (fixture.home_elo, fixture.away_elo) {
        (Some(home), Some(away)) => ((-(home - away).abs()) / ELO_SYMMETRY_SCALE)
            .exp()
            .clamp(ELO_SYMMETRY_CLIP.0, ELO_SYMMETRY_CLIP.1),
        _ => 1.0,
    }
}

fn head_to_head_component(fixture: &Fixture) -> f64 {
    match &fixture.head_to_head {
        Some(sample) if sample.matches >= HEAD_TO_HEAD_MIN_MATCHES => {
            let rate = sample.draws as f64 / sample.matches as f64;
            (rate / HEAD_TO_HEAD_DIVISOR).clamp(HEAD_TO_HEAD_CLIP.0, HEAD_TO_HEAD_CLIP.1)
        }
        _ => 1.0,
    }
}

fn fatigue_component(fixture: &Fixture) -> f64 {
    match (fixture.rest_days_home, fixture.rest_days_away) {
        (Some(home), Some(away)) => {
            let mean_rest = (home + away) / 2.0;
            (1.0 + (FATIGUE_TARGET_REST_DAYS - mean_rest).max(0.0) * FATIGUE_SCALE)
                .clamp(FATIGUE_CLIP.0, FATIGUE_CLIP.1)
        }
        _ => 1.0,
    }
}

fn referee_component(fixture: &Fixture) -> f64 {
    match (fixture.referee_avg_cards, fixture.referee_avg_penalties) {
        (Some(cards), Some(penalties)) => (1.0
            + (1.0 / (cards + penalties).max(1.0)) * REFEREE_SCALE)
            .clamp(REFEREE_CLIP.0, REFEREE_CLIP.1),
        _ => 1.0,
    }
}

fn odds_drift_component(fixture: &Fixture) -> f64 {
    match (&fixture.opening_odds, &fixture.closing_odds) {
        (Some(opening), Some(closing)) => {
            let delta = closing.draw - opening.draw;
            (1.0 + ODDS_DRIFT_SCALE * delta).clamp(ODDS_DRIFT_CLIP.0, ODDS_DRIFT_CLIP.1)
        }
        _ => 1.0,
    }
}

/// Applies [`DrawComponents`] to a base distribution, clamping the adjusted
/// draw probability to `[0.12, 0.38]` and renormalizing home/away
/// proportionally so the triple still sums to 1.
///
/// Fails with [`ScorecastError::InvalidDistribution`] if `dist` does not sum
/// to 1 within tolerance.
pub fn adjust_draw_probability(
    dist: &Distribution,
    components: &DrawComponents,
) -> Result<Distribution, ScorecastError> {
    let sum = dist.p_home + dist.p_draw + dist.p_away;
    DistributionSumAssertion::with_default_tolerance()
        .check(sum)
        .map_err(InvalidDistribution::from)?;

    let multiplier = components.multiplier();
    let adjusted_draw = (dist.p_draw * multiplier).clamp(DRAW_PROBABILITY_FLOOR, DRAW_PROBABILITY_CEILING);
    let remaining = 1.0 - adjusted_draw;
    let old_remaining = dist.p_home + dist.p_away;

    let (mut new_home, mut new_away) = if old_remaining > 0.0 {
        (
            dist.p_home / old_remaining * remaining,
            dist.p_away / old_remaining * remaining,
        )
    } else {
        (remaining / 2.0, remaining / 2.0)
    };

    let mut new_draw = adjusted_draw;
    let total = new_home + new_draw + new_away;
    if total > 0.0 {
        new_home /= total;
        new_draw /= total;
        new_away /= total;
    }

    let entropy = normalized_entropy([new_home, new_draw, new_away]);

    Ok(Distribution {
        p_home: new_home,
        p_draw: new_draw,
        p_away: new_away,
        lambda_home: dist.lambda_home,
        lambda_away: dist.lambda_away,
        entropy,
    })
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;
    use crate::domain::Odds1x2;

    fn base() -> Distribution {
        Distribution {
            p_home: 0.45,
            p_draw: 0.25,
            p_away: 0.30,
            lambda_home: 1.4,
            lambda_away: 0.9,
            entropy: 0.9,
        }
    }

    #[test]
    fn neutral_components_are_a_near_identity() {
        let adjusted = adjust_draw_probability(&base(), &DrawComponents::neutral()).unwrap();
        assert_float_relative_eq!(adjusted.p_draw, 0.25, 1e-9);
        assert_float_relative_eq!(
            adjusted.p_home + adjusted.p_draw + adjusted.p_away,
            1.0,
            1e-9
        );
    }

    #[test]
    fn multiplier_is_clamped_at_upper_bound() {
        let saturating = DrawComponents {
            league_prior: 2.0,
            elo_symmetry: 2.0,
            head_to_head: 2.0,
            weather: 2.0,
            fatigue: 2.0,
            referee: 2.0,
            odds_drift: 2.0,
            xg: 2.0,
        };
        assert_f64_near!(1.35, saturating.multiplier());
        let adjusted = adjust_draw_probability(&base(), &saturating).unwrap();
        assert_float_relative_eq!(adjusted.p_draw, DRAW_PROBABILITY_CEILING, 1e-9);
    }

    #[test]
    fn multiplier_is_clamped_at_lower_bound() {
        let shrinking = DrawComponents {
            league_prior: 0.1,
            elo_symmetry: 0.1,
            head_to_head: 0.1,
            weather: 0.1,
            fatigue: 0.1,
            referee: 0.1,
            odds_drift: 0.1,
            xg: 0.1,
        };
        assert_f64_near!(0.75, shrinking.multiplier());
    }

    #[test]
    fn home_and_away_are_split_evenly_when_both_zero() {
        let degenerate = Distribution {
            p_home: 0.0,
            p_draw: 1.0,
            p_away: 0.0,
            lambda_home: 0.0,
            lambda_away: 0.0,
            entropy: 0.0,
        };
        let adjusted = adjust_draw_probability(&degenerate, &DrawComponents::neutral()).unwrap();
        assert_float_relative_eq!(adjusted.p_home, adjusted.p_away, 1e-9);
    }

    #[test]
    fn saturating_multiplier_matches_worked_scenario() {
        let dist = Distribution {
            p_home: 0.45,
            p_draw: 0.28,
            p_away: 0.27,
            lambda_home: 1.4,
            lambda_away: 0.9,
            entropy: 0.9,
        };
        let saturating = DrawComponents {
            league_prior: 2.0,
            elo_symmetry: 2.0,
            head_to_head: 2.0,
            weather: 2.0,
            fatigue: 2.0,
            referee: 2.0,
            odds_drift: 2.0,
            xg: 2.0,
        };
        let adjusted = adjust_draw_probability(&dist, &saturating).unwrap();
        assert_float_relative_eq!(adjusted.p_draw, 0.378, 1e-9);
        assert_float_relative_eq!(adjusted.p_home, 0.389, 5e-3);
        assert_float_relative_eq!(adjusted.p_away, 0.233, 5e-3);
    }

    fn bare_fixture() -> Fixture {
        Fixture {
            id: "f1".to_string(),
            league: "EPL".into(),
            home_id: "Home".into(),
            away_id: "Away".into(),
            kickoff: None,
            opening_odds: None,
            closing_odds: None,
            weather_draw_index: None,
            rest_days_home: None,
            rest_days_away: None,
            referee_avg_cards: None,
            referee_avg_penalties: None,
            xg_draw_index: None,
            head_to_head: None,
            home_elo: None,
            away_elo: None,
        }
    }

    #[test]
    fn compute_draw_components_is_neutral_with_no_inputs() {
        let components = compute_draw_components(&bare_fixture(), None);
        assert_float_relative_eq!(1.0, components.league_prior, 1e-9);
        assert_float_relative_eq!(1.0, components.elo_symmetry, 1e-9);
        assert_float_relative_eq!(1.0, components.head_to_head, 1e-9);
        assert_float_relative_eq!(1.0, components.weather, 1e-9);
        assert_float_relative_eq!(1.0, components.fatigue, 1e-9);
        assert_float_relative_eq!(1.0, components.referee, 1e-9);
        assert_float_relative_eq!(1.0, components.odds_drift, 1e-9);
        assert_float_relative_eq!(1.0, components.xg, 1e-9);
    }

    #[test]
    fn league_prior_reflects_a_low_draw_rate_league() {
        let league = League {
            code: "EPL".into(),
            name: "Premier League".to_string(),
            country: "England".to_string(),
            tier: 1,
            baseline_draw_rate: 0.20,
            home_advantage_prior: 0.3,
            team_count: 20,
            relegation_zone_count: 3,
            playoff_zone_count: 0,
        };
        let components = compute_draw_components(&bare_fixture(), Some(&league));
        assert!(components.league_prior < 1.0);
        assert!(components.league_prior >= LEAGUE_PRIOR_CLIP.0);
    }

    #[test]
    fn elo_symmetry_shrinks_with_a_large_rating_gap() {
        let mut fixture = bare_fixture();
        fixture.home_elo = Some(1800.0);
        fixture.away_elo = Some(1400.0);
        let components = compute_draw_components(&fixture, None);
        assert!(components.elo_symmetry < 1.0);
        assert!(components.elo_symmetry >= ELO_SYMMETRY_CLIP.0);
    }

    #[test]
    fn head_to_head_is_neutral_below_the_minimum_sample() {
        let mut fixture = bare_fixture();
        fixture.head_to_head = Some(crate::domain::HeadToHeadSample { matches: 2, draws: 2 });
        let components = compute_draw_components(&fixture, None);
        assert_float_relative_eq!(1.0, components.head_to_head, 1e-9);
    }

    #[test]
    fn head_to_head_rewards_a_draw_heavy_rivalry() {
        let mut fixture = bare_fixture();
        fixture.head_to_head = Some(crate::domain::HeadToHeadSample { matches: 8, draws: 6 });
        let components = compute_draw_components(&fixture, None);
        assert_float_relative_eq!(HEAD_TO_HEAD_CLIP.1, components.head_to_head, 1e-9);
    }

    #[test]
    fn fatigue_rises_when_rest_is_below_target() {
        let mut fixture = bare_fixture();
        fixture.rest_days_home = Some(2.0);
        fixture.rest_days_away = Some(2.0);
        let components = compute_draw_components(&fixture, None);
        assert_float_relative_eq!(1.0 + 2.0 * FATIGUE_SCALE, components.fatigue, 1e-9);
    }

    #[test]
    fn referee_component_is_higher_for_a_lenient_referee() {
        let mut fixture = bare_fixture();
        fixture.referee_avg_cards = Some(1.0);
        fixture.referee_avg_penalties = Some(0.0);
        let components = compute_draw_components(&fixture, None);
        assert!(components.referee > 1.0);
        assert!(components.referee <= REFEREE_CLIP.1);
    }

    #[test]
    fn odds_drift_tracks_a_shortening_draw_price() {
        let mut fixture = bare_fixture();
        fixture.opening_odds = Some(Odds1x2 { home: 2.0, draw: 3.0, away: 3.5 });
        fixture.closing_odds = Some(Odds1x2 { home: 1.9, draw: 3.3, away: 3.6 });
        let components = compute_draw_components(&fixture, None);
        assert!(components.odds_drift > 1.0);
    }

    #[test]
    fn rejects_a_distribution_not_summing_to_one() {
        let broken = Distribution {
            p_home: 0.5,
            p_draw: 0.5,
            p_away: 0.5,
            lambda_home: 1.0,
            lambda_away: 1.0,
            entropy: 1.0,
        };
        let err = adjust_draw_probability(&broken, &DrawComponents::neutral()).unwrap_err();
        assert!(matches!(err, ScorecastError::InvalidDistribution(_)));
    }
}
