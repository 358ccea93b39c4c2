//! Core entities shared by the rating engine and the ticket generator.
//!
//! Entities are defined by role, not storage: a [`Match`] is read-only
//! training history, a [`Fixture`] is a single upcoming slate entry, and a
//! [`FitArtifact`] is the immutable output of one training run.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod error;

/// Identifies a team within a league. Opaque beyond equality and hashing.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifies a league. Opaque beyond equality and hashing.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeagueCode(pub String);

impl From<&str> for LeagueCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Immutable structural metadata for a league within a fitting run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct League {
    pub code: LeagueCode,
    pub name: String,
    pub country: String,
    pub tier: u8,
    pub baseline_draw_rate: f64,
    pub home_advantage_prior: f64,
    pub team_count: u16,
    pub relegation_zone_count: u16,
    pub playoff_zone_count: u16,
}

/// A team's identity and, once fitted, its attack/defense strengths.
///
/// The estimator is the sole writer of `attack`/`defense`; every other
/// consumer treats a [`FitArtifact`] read-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub league: LeagueCode,
    pub canonical_name: String,
}

/// The three-outcome categorical: home win, draw, away win.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, strum_macros::EnumIter)]
pub enum Pick {
    Home,
    Draw,
    Away,
}

impl Pick {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pick::Home => "1",
            Pick::Draw => "X",
            Pick::Away => "2",
        }
    }
}

impl std::fmt::Display for Pick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closing (or opening) 1x2 market odds for a match or fixture.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Odds1x2 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Odds1x2 {
    /// Market-implied probabilities, normalized to remove the overround.
    pub fn implied_probs(&self) -> (f64, f64, f64) {
        let raw = (1.0 / self.home, 1.0 / self.draw, 1.0 / self.away);
        let sum = raw.0 + raw.1 + raw.2;
        (raw.0 / sum, raw.1 / sum, raw.2 / sum)
    }
}

/// A completed historical match. Read-only input to the estimator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    pub league: LeagueCode,
    pub date: NaiveDate,
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub home_goals: u16,
    pub away_goals: u16,
    pub closing_odds: Option<Odds1x2>,
}

/// Head-to-head sample supplied as a precomputed structural input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeadToHeadSample {
    pub matches: u32,
    pub draws: u32,
}

/// An upcoming fixture with whatever structural inputs the orchestration
/// layer was able to resolve. Every field beyond team identity is optional:
/// absent inputs make their corresponding draw component neutral.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub league: LeagueCode,
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub kickoff: Option<chrono::DateTime<chrono::Utc>>,
    pub opening_odds: Option<Odds1x2>,
    pub closing_odds: Option<Odds1x2>,
    pub weather_draw_index: Option<f64>,
    pub rest_days_home: Option<f64>,
    pub rest_days_away: Option<f64>,
    pub referee_avg_cards: Option<f64>,
    pub referee_avg_penalties: Option<f64>,
    pub xg_draw_index: Option<f64>,
    pub head_to_head: Option<HeadToHeadSample>,
    pub home_elo: Option<f64>,
    pub away_elo: Option<f64>,
}

/// Metadata recorded alongside a [`FitArtifact`]: what the fitting loop
/// actually did, for diagnostics and reproducibility, not for behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitMetadata {
    pub iterations: u32,
    pub max_delta: f64,
    pub rho_fallback: bool,
    pub normalization: &'static str,
    pub uncalibrated_teams: Vec<TeamId>,
}

/// Output of one training run: attack/defense strengths, home advantage, and
/// the Dixon-Coles dependency parameter. Produced once, then immutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitArtifact {
    pub attack: HashMap<TeamId, f64>,
    pub defense: HashMap<TeamId, f64>,
    pub home_advantage: f64,
    pub rho: f64,
    pub reference_date: NaiveDate,
    pub xi: f64,
    pub metadata: FitMetadata,
}

impl FitArtifact {
    /// Attack strength for `team`, or the neutral log-additive value `0.0`
    /// (`exp(0) == 1`, a league-average scoring rate) if it never appeared
    /// in the fitted history.
    pub fn attack_of(&self, team: &TeamId) -> f64 {
        self.attack.get(team).copied().unwrap_or(0.0)
    }

    pub fn defense_of(&self, team: &TeamId) -> f64 {
        self.defense.get(team).copied().unwrap_or(0.0)
    }
}

/// A full 1x2 probability triple plus expected goals and normalized entropy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub entropy: f64,
}

impl Distribution {
    pub fn as_triple(&self) -> [f64; 3] {
        [self.p_home, self.p_draw, self.p_away]
    }

    pub fn argmax(&self) -> Pick {
        if self.p_home >= self.p_draw && self.p_home >= self.p_away {
            Pick::Home
        } else if self.p_draw >= self.p_away {
            Pick::Draw
        } else {
            Pick::Away
        }
    }

    pub fn prob_of(&self, pick: Pick) -> f64 {
        match pick {
            Pick::Home => self.p_home,
            Pick::Draw => self.p_draw,
            Pick::Away => self.p_away,
        }
    }
}

/// The eight bounded multiplicative structural components that adjust a
/// base draw probability. Each defaults to 1.0 (neutral) when its required
/// input is absent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawComponents {
    pub league_prior: f64,
    pub elo_symmetry: f64,
    pub head_to_head: f64,
    pub weather: f64,
    pub fatigue: f64,
    pub referee: f64,
    pub odds_drift: f64,
    pub xg: f64,
}

impl DrawComponents {
    pub const fn neutral() -> Self {
        Self {
            league_prior: 1.0,
            elo_symmetry: 1.0,
            head_to_head: 1.0,
            weather: 1.0,
            fatigue: 1.0,
            referee: 1.0,
            odds_drift: 1.0,
            xg: 1.0,
        }
    }

    /// The bounded multiplier applied to the draw probability.
    pub fn multiplier(&self) -> f64 {
        let product = self.league_prior
            * self.elo_symmetry
            * self.head_to_head
            * self.weather
            * self.fatigue
            * self.referee
            * self.odds_drift
            * self.xg;
        product.clamp(0.75, 1.35)
    }
}

impl Default for DrawComponents {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Per-fixture indicator of a large, possibly model-disagreeing, late
/// market move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LateShock {
    pub triggered: bool,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl LateShock {
    pub fn none() -> Self {
        Self {
            triggered: false,
            score: 0.0,
            reasons: Vec::new(),
        }
    }
}

/// Named archetype controlling the bias of an entire bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    FavoriteLock,
    Balanced,
    DrawSelective,
    AwayEdge,
}

/// Per-ticket constraint bundle, identified by a letter in the spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Diagnostics attached to a single generated ticket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketDiagnostics {
    pub draw_count: usize,
    pub favorite_count: usize,
    pub underdog_count: usize,
    pub entropy: f64,
    pub ev_score: f64,
    pub contradictions: usize,
}

/// One accumulator-style pick sequence over the whole slate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    pub picks: Vec<Pick>,
    pub role: Role,
    pub archetype: Archetype,
    pub diagnostics: TicketDiagnostics,
}

/// Per-position outcome mix across every ticket in a bundle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverageDiagnostics {
    pub home_share: Vec<f64>,
    pub draw_share: Vec<f64>,
    pub away_share: Vec<f64>,
}

/// Portfolio-level summary statistics over a bundle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioDiagnostics {
    pub mean_ev_score: f64,
    pub mean_pairwise_hamming: f64,
    pub min_pairwise_hamming: usize,
}

/// An ordered collection of tickets plus bundle-level diagnostics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bundle {
    pub tickets: Vec<Ticket>,
    pub coverage: CoverageDiagnostics,
    pub portfolio: PortfolioDiagnostics,
    pub underpopulated: bool,
}
