use tinyrand::StdRand;

use super::*;

fn fixture(id: &str) -> Fixture {
    Fixture {
        id: id.to_string(),
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

fn distribution(p_home: f64, p_draw: f64, p_away: f64) -> Distribution {
    Distribution {
        p_home,
        p_draw,
        p_away,
        lambda_home: 1.4,
        lambda_away: 0.9,
        entropy: normalized_entropy([p_home, p_draw, p_away]),
    }
}

fn sample_slate(n: usize) -> (Vec<Fixture>, Vec<Distribution>, Vec<LateShock>) {
    let fixtures: Vec<Fixture> = (0..n).map(|i| fixture(&format!("f{i}"))).collect();
    let distributions: Vec<Distribution> = (0..n)
        .map(|i| match i % 3 {
            0 => distribution(0.55, 0.25, 0.20),
            1 => distribution(0.30, 0.35, 0.35),
            _ => distribution(0.20, 0.25, 0.55),
        })
        .collect();
    let shocks: Vec<LateShock> = (0..n).map(|_| LateShock::none()).collect();
    (fixtures, distributions, shocks)
}

#[test]
fn generate_ticket_respects_draw_bounds() {
    let (fixtures, distributions, shocks) = sample_slate(14);
    let correlation = Matrix::allocate(14, 14);
    let mut rng = StdRand::default();
    let config = GenerationConfig::default();
    let ticket = generate_ticket(
        &fixtures,
        &distributions,
        &correlation,
        &shocks,
        Role::C,
        Archetype::Balanced,
        &config,
        &mut rng,
    )
    .unwrap();
    let constraints = constraints_for(Role::C);
    assert!(ticket.diagnostics.draw_count >= constraints.min_draws(14));
    assert!(ticket.diagnostics.draw_count <= constraints.max_draws(14));
}

#[test]
fn generate_ticket_honours_archetype_veto_for_favorite_lock() {
    let (fixtures, distributions, shocks) = sample_slate(14);
    let correlation = Matrix::allocate(14, 14);
    let mut rng = StdRand::default();
    let config = GenerationConfig::default();
    let ticket = generate_ticket(
        &fixtures,
        &distributions,
        &correlation,
        &shocks,
        Role::B,
        Archetype::FavoriteLock,
        &config,
        &mut rng,
    )
    .unwrap();
    assert_eq!(Archetype::FavoriteLock, ticket.archetype);
    assert!(ticket.diagnostics.favorite_count as f64 >= 0.7 * 14.0);
}

#[test]
fn generate_bundle_produces_requested_ticket_count() {
    let (fixtures, distributions, shocks) = sample_slate(14);
    let correlation = Matrix::allocate(14, 14);
    let mut rng = StdRand::default();
    let config = GenerationConfig::default();
    let (bundle, _warnings) =
        generate_bundle(&fixtures, &distributions, &correlation, &shocks, 5, &config, &mut rng).unwrap();
    assert_eq!(5, bundle.tickets.len());
    assert!(!bundle.underpopulated);
}

#[test]
fn generate_bundle_rejects_mismatched_lengths() {
    let (fixtures, distributions, _) = sample_slate(14);
    let shocks = vec![LateShock::none(); 10];
    let correlation = Matrix::allocate(14, 14);
    let mut rng = StdRand::default();
    let config = GenerationConfig::default();
    let err = generate_bundle(&fixtures, &distributions, &correlation, &shocks, 5, &config, &mut rng).unwrap_err();
    assert!(matches!(err, ScorecastError::InvalidInput(_)));
}

#[test]
fn hamming_counts_differing_positions() {
    let a = [Pick::Home, Pick::Draw, Pick::Away];
    let b = [Pick::Home, Pick::Home, Pick::Away];
    assert_eq!(1, hamming(&a, &b));
}

#[test]
fn ticket_entropy_is_zero_for_all_home() {
    let picks = vec![Pick::Home; 10];
    assert_eq!(0.0, ticket_entropy(&picks));
}

fn stub_ticket(picks: Vec<Pick>, ev_score: f64) -> Ticket {
    Ticket {
        picks,
        role: Role::A,
        archetype: Archetype::Balanced,
        diagnostics: TicketDiagnostics {
            draw_count: 0,
            favorite_count: 0,
            underdog_count: 0,
            entropy: 0.0,
            ev_score,
            contradictions: 0,
        },
    }
}

#[test]
fn select_diverse_portfolio_drops_duplicate_pick_vectors() {
    let duplicate = vec![Pick::Home, Pick::Draw, Pick::Away];
    let pool = vec![
        stub_ticket(duplicate.clone(), 0.9),
        stub_ticket(duplicate.clone(), 0.8),
        stub_ticket(vec![Pick::Away, Pick::Home, Pick::Draw], 0.7),
    ];
    let selected = select_diverse_portfolio(pool, 3);
    assert_eq!(2, selected.len());
}

#[test]
fn guarantee_favorite_hedge_converts_a_remaining_strong_favorite() {
    let distributions = vec![
        distribution(0.70, 0.20, 0.10),
        distribution(0.30, 0.35, 0.35),
    ];
    // one pick already deviates from its argmax, but the strong favorite at
    // index 0 is still untouched and must be hedged
    let mut picks = vec![Pick::Home, Pick::Draw];
    let mut rng = StdRand::default();
    guarantee_favorite_hedge(&mut picks, &distributions, &mut rng);
    assert_ne!(Pick::Home, picks[0]);
}

#[test]
fn guarantee_favorite_hedge_leaves_weak_favorites_alone() {
    let distributions = vec![distribution(0.55, 0.25, 0.20)];
    let mut picks = vec![Pick::Home];
    let mut rng = StdRand::default();
    guarantee_favorite_hedge(&mut picks, &distributions, &mut rng);
    assert_eq!(Pick::Home, picks[0]);
}
