//! C6: the constraint-driven jackpot ticket generator.
//!
//! Each ticket is seeded from the raw model favorites, then passed through
//! an ordered repair loop that enforces its role's draw/favorite/underdog
//! bounds, hedges flagged fixtures, breaks over-correlated duplicate picks,
//! nudges the pick mix into an entropy band and finally vetoes tickets that
//! don't match their archetype. The bundle is assembled by over-generating
//! a candidate pool and greedily selecting for pairwise diversity.

use scorecast_num::linear::matrix::Matrix;
use tinyrand::{Rand, RandRange};

use crate::domain::error::{Degenerate, EmptyInputAssertion, InvalidInput, LengthMismatchAssertion, ScorecastError, Warning};
use crate::domain::{Archetype, Bundle, CoverageDiagnostics, Distribution, Fixture, LateShock, Pick, PortfolioDiagnostics, Role, Ticket, TicketDiagnostics};
use crate::model::correlation::DEFAULT_CORRELATION_BREAK_THRESHOLD;
use crate::model::roles::{constraints_for, RoleConstraints, ROLE_ROTATION};
use crate::scoregrid::normalized_entropy;

const FAVORITE_PROB_THRESHOLD: f64 = 0.5;
const UNDERDOG_PROB_THRESHOLD: f64 = 0.30;
const DEFAULT_MAX_ATTEMPTS_PER_TICKET: usize = 3;
const POOL_OVERSAMPLE_FACTOR: usize = 2;

pub struct GenerationConfig {
    pub correlation_break_threshold: f64,
    pub max_attempts_per_ticket: usize,
    pub min_ev_score: f64,
    pub ev_policy: fn(&[Pick], &[Distribution]) -> f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            correlation_break_threshold: DEFAULT_CORRELATION_BREAK_THRESHOLD,
            max_attempts_per_ticket: DEFAULT_MAX_ATTEMPTS_PER_TICKET,
            min_ev_score: 0.0,
            ev_policy: default_ev_policy,
        }
    }
}

/// Geometric mean of each fixture's picked-outcome probability.
pub fn default_ev_policy(picks: &[Pick], distributions: &[Distribution]) -> f64 {
    let log_sum: f64 = picks
        .iter()
        .zip(distributions)
        .map(|(pick, dist)| dist.prob_of(*pick).max(1e-9).ln())
        .sum();
    (log_sum / picks.len() as f64).exp()
}

fn non_draw_argmax(dist: &Distribution) -> Pick {
    if dist.p_home >= dist.p_away {
        Pick::Home
    } else {
        Pick::Away
    }
}

fn second_best(dist: &Distribution, exclude: Pick) -> Pick {
    match exclude {
        Pick::Home => {
            if dist.p_draw >= dist.p_away {
                Pick::Draw
            } else {
                Pick::Away
            }
        }
        Pick::Draw => non_draw_argmax(dist),
        Pick::Away => {
            if dist.p_draw >= dist.p_home {
                Pick::Draw
            } else {
                Pick::Home
            }
        }
    }
}

fn least_likely_pick(dist: &Distribution) -> Pick {
    let mut candidates = [
        (Pick::Home, dist.p_home),
        (Pick::Draw, dist.p_draw),
        (Pick::Away, dist.p_away),
    ];
    candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    candidates[0].0
}

fn margin(dist: &Distribution, pick: Pick) -> f64 {
    let others: f64 = [Pick::Home, Pick::Draw, Pick::Away]
        .into_iter()
        .filter(|p| *p != pick)
        .map(|p| dist.prob_of(p))
        .fold(f64::MIN, f64::max);
    dist.prob_of(pick) - others
}

fn draw_margin(dist: &Distribution) -> f64 {
    dist.p_draw - dist.p_home.max(dist.p_away)
}

fn is_favorite(dist: &Distribution, pick: Pick) -> bool {
    pick == dist.argmax() && dist.prob_of(pick) >= FAVORITE_PROB_THRESHOLD
}

fn ticket_entropy(picks: &[Pick]) -> f64 {
    let n = picks.len() as f64;
    let home = picks.iter().filter(|p| **p == Pick::Home).count() as f64 / n;
    let draw = picks.iter().filter(|p| **p == Pick::Draw).count() as f64 / n;
    let away = picks.iter().filter(|p| **p == Pick::Away).count() as f64 / n;
    normalized_entropy([home, draw, away])
}

fn enforce_draw_bounds(picks: &mut [Pick], distributions: &[Distribution], constraints: &RoleConstraints) {
    let n = picks.len();
    let min_draws = constraints.min_draws(n);
    let max_draws = constraints.max_draws(n);
    let mut draw_count = picks.iter().filter(|p| **p == Pick::Draw).count();

    if draw_count < min_draws {
        let mut candidates: Vec<usize> = (0..n).filter(|&i| picks[i] != Pick::Draw).collect();
        candidates.sort_by(|&a, &b| draw_margin(&distributions[b]).partial_cmp(&draw_margin(&distributions[a])).unwrap());
        for i in candidates {
            if draw_count >= min_draws {
                break;
            }
            picks[i] = Pick::Draw;
            draw_count += 1;
        }
    } else if draw_count > max_draws {
        let mut candidates: Vec<usize> = (0..n).filter(|&i| picks[i] == Pick::Draw).collect();
        candidates.sort_by(|&a, &b| draw_margin(&distributions[a]).partial_cmp(&draw_margin(&distributions[b])).unwrap());
        for i in candidates {
            if draw_count <= max_draws {
                break;
            }
            picks[i] = non_draw_argmax(&distributions[i]);
            draw_count -= 1;
        }
    }
}

fn enforce_favorite_underdog_counts(picks: &mut [Pick], distributions: &[Distribution], constraints: &RoleConstraints) {
    let n = picks.len();
    let max_favorites = constraints.max_favorites(n);
    let min_underdogs = constraints.min_underdogs(n);

    let mut favorite_idxs: Vec<usize> = (0..n).filter(|&i| is_favorite(&distributions[i], picks[i])).collect();
    if favorite_idxs.len() > max_favorites {
        favorite_idxs.sort_by(|&a, &b| margin(&distributions[a], picks[a]).partial_cmp(&margin(&distributions[b], picks[b])).unwrap());
        for &i in favorite_idxs.iter().take(favorite_idxs.len() - max_favorites) {
            picks[i] = second_best(&distributions[i], picks[i]);
        }
    }

    let mut underdog_count = (0..n).filter(|&i| distributions[i].prob_of(picks[i]) < UNDERDOG_PROB_THRESHOLD).count();
    if underdog_count < min_underdogs {
        let mut candidates: Vec<usize> = (0..n).collect();
        candidates.sort_by(|&a, &b| margin(&distributions[a], picks[a]).partial_cmp(&margin(&distributions[b], picks[b])).unwrap());
        for i in candidates {
            if underdog_count >= min_underdogs {
                break;
            }
            if distributions[i].prob_of(picks[i]) >= UNDERDOG_PROB_THRESHOLD {
                let alt = least_likely_pick(&distributions[i]);
                if distributions[i].prob_of(alt) < UNDERDOG_PROB_THRESHOLD {
                    picks[i] = alt;
                    underdog_count += 1;
                }
            }
        }
    }
}

fn hedge_late_shocks(picks: &mut [Pick], distributions: &[Distribution], shocks: &[LateShock]) {
    for i in 0..picks.len() {
        if shocks[i].triggered && picks[i] == distributions[i].argmax() {
            picks[i] = second_best(&distributions[i], picks[i]);
        }
    }
}

fn break_correlated_duplicates<R: Rand>(
    picks: &mut [Pick],
    distributions: &[Distribution],
    correlation: &Matrix<f64>,
    threshold: f64,
    rng: &mut R,
) {
    let n = picks.len();
    for i in 0..n {
        for j in (i + 1)..n {
            if correlation[(i, j)] > threshold && picks[i] == picks[j] {
                rng.next_u64();
                let weaker = if margin(&distributions[i], picks[i]) <= margin(&distributions[j], picks[j]) {
                    i
                } else {
                    j
                };
                picks[weaker] = second_best(&distributions[weaker], picks[weaker]);
            }
        }
    }
}

fn adjust_entropy_band<R: Rand>(
    picks: &mut [Pick],
    distributions: &[Distribution],
    constraints: &RoleConstraints,
    rng: &mut R,
) {
    let n = picks.len();
    for _ in 0..n {
        let entropy = ticket_entropy(picks);
        if constraints.entropy_band.contains(&entropy) {
            return;
        }
        let idx = rng.next_range(0..n);
        if entropy < *constraints.entropy_band.start() {
            if is_favorite(&distributions[idx], picks[idx]) {
                picks[idx] = second_best(&distributions[idx], picks[idx]);
            }
        } else {
            picks[idx] = distributions[idx].argmax();
        }
    }
}

const STRONG_FAVORITE_PROB_THRESHOLD: f64 = 0.65;

fn is_strong_favorite(dist: &Distribution, pick: Pick) -> bool {
    pick == dist.argmax() && dist.prob_of(pick) >= STRONG_FAVORITE_PROB_THRESHOLD
}

fn guarantee_favorite_hedge<R: Rand>(picks: &mut [Pick], distributions: &[Distribution], rng: &mut R) {
    let strong_favorite_idx = (0..picks.len())
        .filter(|&idx| is_strong_favorite(&distributions[idx], picks[idx]))
        .min_by(|&a, &b| {
            margin(&distributions[a], picks[a])
                .partial_cmp(&margin(&distributions[b], picks[b]))
                .unwrap()
        });
    if let Some(idx) = strong_favorite_idx {
        rng.next_u64();
        picks[idx] = second_best(&distributions[idx], picks[idx]);
    }
}

const DRAW_SELECTIVE_LAMBDA_GAP: f64 = 0.30;
const DRAW_SELECTIVE_MAX_AWAY_FRACTION: f64 = 0.15;
const DRAW_ODDS_CEILING: f64 = 3.40;
const ARCHETYPE_HOME_PROB_THRESHOLD: f64 = 0.52;
const ARCHETYPE_BALANCED_RATE_THRESHOLD: f64 = 0.4;
const ARCHETYPE_AWAY_VALUE_RATE_THRESHOLD: f64 = 0.3;
const BALANCED_LAMBDA_GAP: f64 = 0.35;
const AWAY_VALUE_EDGE: f64 = 0.05;

/// Chooses one archetype for the whole slate, per the selection order
/// FAVORITE_LOCK > DRAW_SELECTIVE > AWAY_EDGE > BALANCED.
pub fn select_archetype(fixtures: &[Fixture], distributions: &[Distribution]) -> Archetype {
    let n = distributions.len() as f64;
    let avg_home_prob = distributions.iter().map(|d| d.p_home).sum::<f64>() / n;
    let balanced_rate = distributions
        .iter()
        .filter(|d| (d.lambda_home - d.lambda_away).abs() <= BALANCED_LAMBDA_GAP)
        .count() as f64
        / n;
    let away_value_rate = fixtures
        .iter()
        .zip(distributions)
        .filter(|(fixture, dist)| {
            fixture
                .closing_odds
                .as_ref()
                .map(|odds| {
                    let (_, _, market_away) = odds.implied_probs();
                    dist.p_away - market_away >= AWAY_VALUE_EDGE
                })
                .unwrap_or(false)
        })
        .count() as f64
        / n;

    if avg_home_prob > ARCHETYPE_HOME_PROB_THRESHOLD {
        Archetype::FavoriteLock
    } else if balanced_rate > ARCHETYPE_BALANCED_RATE_THRESHOLD {
        Archetype::DrawSelective
    } else if away_value_rate > ARCHETYPE_AWAY_VALUE_RATE_THRESHOLD {
        Archetype::AwayEdge
    } else {
        Archetype::Balanced
    }
}

fn passes_archetype_veto(
    archetype: Archetype,
    picks: &[Pick],
    distributions: &[Distribution],
    fixtures: &[Fixture],
) -> bool {
    let n = picks.len() as f64;
    let home_count = picks.iter().filter(|p| **p == Pick::Home).count();
    let draw_count = picks.iter().filter(|p| **p == Pick::Draw).count();
    let away_count = picks.iter().filter(|p| **p == Pick::Away).count();
    let favorite_count = picks.iter().zip(distributions).filter(|(p, d)| **p == d.argmax()).count();

    match archetype {
        Archetype::FavoriteLock => favorite_count as f64 >= 0.7 * n,
        Archetype::DrawSelective => {
            if away_count as f64 > DRAW_SELECTIVE_MAX_AWAY_FRACTION * n {
                return false;
            }
            picks.iter().zip(distributions).zip(fixtures).all(|((pick, dist), fixture)| {
                if *pick != Pick::Draw {
                    return true;
                }
                if (dist.lambda_home - dist.lambda_away).abs() > DRAW_SELECTIVE_LAMBDA_GAP {
                    return false;
                }
                fixture
                    .closing_odds
                    .as_ref()
                    .map(|odds| odds.draw <= DRAW_ODDS_CEILING)
                    .unwrap_or(true)
            })
        }
        Archetype::AwayEdge => away_count as f64 >= 0.25 * n,
        Archetype::Balanced => {
            let max_share = home_count.max(draw_count).max(away_count) as f64 / n;
            max_share <= 0.65
        }
    }
}

/// Generates a single ticket for `role`, retrying the repair loop up to
/// `config.max_attempts_per_ticket` times before giving up.
pub fn generate_ticket<R: Rand>(
    fixtures: &[Fixture],
    distributions: &[Distribution],
    correlation: &Matrix<f64>,
    shocks: &[LateShock],
    role: Role,
    archetype: Archetype,
    config: &GenerationConfig,
    rng: &mut R,
) -> Option<Ticket> {
    let constraints = constraints_for(role);

    for _ in 0..config.max_attempts_per_ticket {
        let mut picks: Vec<Pick> = distributions.iter().map(Distribution::argmax).collect();

        enforce_draw_bounds(&mut picks, distributions, &constraints);
        enforce_favorite_underdog_counts(&mut picks, distributions, &constraints);
        if constraints.hedge_shocks {
            hedge_late_shocks(&mut picks, distributions, shocks);
        }
        break_correlated_duplicates(&mut picks, distributions, correlation, config.correlation_break_threshold, rng);
        adjust_entropy_band(&mut picks, distributions, &constraints, rng);
        guarantee_favorite_hedge(&mut picks, distributions, rng);

        if !passes_archetype_veto(archetype, &picks, distributions, fixtures) {
            continue;
        }

        let ev_score = (config.ev_policy)(&picks, distributions);
        if ev_score < config.min_ev_score {
            continue;
        }

        let draw_count = picks.iter().filter(|p| **p == Pick::Draw).count();
        let favorite_count = picks.iter().zip(distributions).filter(|(p, d)| is_favorite(d, **p)).count();
        let underdog_count = picks.iter().zip(distributions).filter(|(p, d)| d.prob_of(**p) < UNDERDOG_PROB_THRESHOLD).count();
        let contradictions = picks.iter().zip(distributions).filter(|(p, d)| **p != d.argmax()).count();
        let entropy = ticket_entropy(&picks);

        return Some(Ticket {
            picks,
            role,
            archetype,
            diagnostics: TicketDiagnostics {
                draw_count,
                favorite_count,
                underdog_count,
                entropy,
                ev_score,
                contradictions,
            },
        });
    }
    None
}

fn hamming(a: &[Pick], b: &[Pick]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Drops tickets whose pick vector duplicates one already kept, preferring
/// the earlier (higher EV-sorted, if the caller sorted first) occurrence.
fn dedupe_by_picks(pool: Vec<Ticket>) -> Vec<Ticket> {
    let mut seen: Vec<Vec<Pick>> = Vec::new();
    pool.into_iter()
        .filter(|ticket| {
            if seen.iter().any(|picks| picks == &ticket.picks) {
                false
            } else {
                seen.push(ticket.picks.clone());
                true
            }
        })
        .collect()
}

fn select_diverse_portfolio(pool: Vec<Ticket>, n: usize) -> Vec<Ticket> {
    let mut pool = dedupe_by_picks(pool);
    if pool.len() <= n {
        return pool;
    }
    pool.sort_by(|a, b| b.diagnostics.ev_score.partial_cmp(&a.diagnostics.ev_score).unwrap());
    let mut selected = vec![pool.remove(0)];
    while selected.len() < n && !pool.is_empty() {
        let best_idx = pool
            .iter()
            .enumerate()
            .max_by_key(|(_, candidate)| selected.iter().map(|s| hamming(&s.picks, &candidate.picks)).min().unwrap_or(0))
            .map(|(idx, _)| idx)
            .unwrap();
        selected.push(pool.remove(best_idx));
    }
    selected
}

fn coverage_diagnostics(tickets: &[Ticket], fixtures: usize) -> CoverageDiagnostics {
    let mut home = vec![0.0; fixtures];
    let mut draw = vec![0.0; fixtures];
    let mut away = vec![0.0; fixtures];
    for ticket in tickets {
        for (i, pick) in ticket.picks.iter().enumerate() {
            match pick {
                Pick::Home => home[i] += 1.0,
                Pick::Draw => draw[i] += 1.0,
                Pick::Away => away[i] += 1.0,
            }
        }
    }
    let total = (tickets.len().max(1)) as f64;
    for share in [&mut home, &mut draw, &mut away] {
        for value in share.iter_mut() {
            *value /= total;
        }
    }
    CoverageDiagnostics {
        home_share: home,
        draw_share: draw,
        away_share: away,
    }
}

fn portfolio_diagnostics(tickets: &[Ticket]) -> PortfolioDiagnostics {
    let mean_ev_score = tickets.iter().map(|t| t.diagnostics.ev_score).sum::<f64>() / tickets.len().max(1) as f64;
    let mut pairwise = Vec::new();
    for i in 0..tickets.len() {
        for j in (i + 1)..tickets.len() {
            pairwise.push(hamming(&tickets[i].picks, &tickets[j].picks));
        }
    }
    let mean_pairwise_hamming = if pairwise.is_empty() {
        0.0
    } else {
        pairwise.iter().sum::<usize>() as f64 / pairwise.len() as f64
    };
    let min_pairwise_hamming = pairwise.into_iter().min().unwrap_or(0);
    PortfolioDiagnostics {
        mean_ev_score,
        mean_pairwise_hamming,
        min_pairwise_hamming,
    }
}

/// Generates a full bundle of `n` tickets by over-sampling a candidate pool
/// and greedily selecting for pairwise diversity.
///
/// Fails with [`ScorecastError::Degenerate`] if `fixtures` is empty, or with
/// [`ScorecastError::InvalidInput`] if `distributions`/`shocks` don't match
/// `fixtures` in length.
pub fn generate_bundle<R: Rand>(
    fixtures: &[Fixture],
    distributions: &[Distribution],
    correlation: &Matrix<f64>,
    shocks: &[LateShock],
    n: usize,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<(Bundle, Vec<Warning>), ScorecastError> {
    EmptyInputAssertion::check(fixtures.len()).map_err(Degenerate::from)?;
    LengthMismatchAssertion::check("fixtures", fixtures.len(), "distributions", distributions.len())
        .map_err(InvalidInput::from)?;
    LengthMismatchAssertion::check("fixtures", fixtures.len(), "shocks", shocks.len()).map_err(InvalidInput::from)?;

    let mut warnings = Vec::new();
    let archetype = select_archetype(fixtures, distributions);
    let pool_target = n * POOL_OVERSAMPLE_FACTOR;
    let max_total_attempts = n * 3 * config.max_attempts_per_ticket.max(1);

    let mut pool: Vec<Ticket> = Vec::new();
    let mut role_cycle = ROLE_ROTATION.iter().cycle();
    let mut generated = 0;
    while pool.len() < pool_target && generated < max_total_attempts {
        let role = *role_cycle.next().unwrap();
        if let Some(ticket) = generate_ticket(fixtures, distributions, correlation, shocks, role, archetype, config, rng) {
            if !pool.iter().any(|existing: &Ticket| existing.picks == ticket.picks) {
                pool.push(ticket);
            }
        }
        generated += 1;
    }

    let underpopulated = pool.len() < n;
    if underpopulated {
        warnings.push(Warning::UnderpopulatedBundle {
            requested: n,
            produced: pool.len(),
        });
    }

    let selected = select_diverse_portfolio(pool, n);
    let coverage = coverage_diagnostics(&selected, fixtures.len());
    let portfolio = portfolio_diagnostics(&selected);

    Ok((
        Bundle {
            tickets: selected,
            coverage,
            portfolio,
            underpopulated,
        },
        warnings,
    ))
}

#[cfg(test)]
mod tests;
