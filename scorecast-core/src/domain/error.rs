//! Typed errors and the assertions that produce them.
//!
//! Only [`ScorecastError`] is fatal — it is returned from `fit`, `predict`
//! and `generate_bundle` when a call-site precondition is violated. Everything
//! else the core detects mid-computation (numerical clamping, an
//! unreachable collaborator, an under-populated bundle) is non-fatal and is
//! reported through [`Warning`] instead.

use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use thiserror::Error;

/// Fatal errors raised to the caller. The core never raises for a single
/// bad match or fixture; these only fire for call-site contract violations.
#[derive(Debug, Error)]
pub enum ScorecastError {
    #[error("{0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("{0}")]
    Degenerate(#[from] Degenerate),

    #[error("{0}")]
    InvalidDistribution(#[from] InvalidDistribution),
}

#[derive(Debug, Error)]
pub enum InvalidInput {
    #[error("{0}")]
    NonFinite(#[from] NonFiniteAssertion),

    #[error("{0}")]
    Negative(#[from] NonNegativeAssertion),

    #[error("{0}")]
    LengthMismatch(#[from] LengthMismatchAssertion),
}

#[derive(Debug, Error)]
#[error("{left_name} has length {left_len}, but {right_name} has length {right_len}")]
pub struct LengthMismatchAssertion {
    pub left_name: &'static str,
    pub left_len: usize,
    pub right_name: &'static str,
    pub right_len: usize,
}
impl LengthMismatchAssertion {
    pub fn check(
        left_name: &'static str,
        left_len: usize,
        right_name: &'static str,
        right_len: usize,
    ) -> Result<(), Self> {
        if left_len == right_len {
            Ok(())
        } else {
            Err(Self {
                left_name,
                left_len,
                right_name,
                right_len,
            })
        }
    }
}

#[derive(Debug, Error)]
#[error("field {field} must be finite, got {value}")]
pub struct NonFiniteAssertion {
    pub field: &'static str,
    pub value: f64,
}
impl NonFiniteAssertion {
    pub fn check(field: &'static str, value: f64) -> Result<(), Self> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self { field, value })
        }
    }
}

#[derive(Debug, Error)]
#[error("field {field} must be non-negative, got {value}")]
pub struct NonNegativeAssertion {
    pub field: &'static str,
    pub value: f64,
}
impl NonNegativeAssertion {
    pub fn check(field: &'static str, value: f64) -> Result<(), Self> {
        if value >= 0.0 {
            Ok(())
        } else {
            Err(Self { field, value })
        }
    }
}

#[derive(Debug, Error)]
pub enum Degenerate {
    #[error("{0}")]
    EmptyInput(#[from] EmptyInputAssertion),

    #[error("{0}")]
    InsufficientTeams(#[from] InsufficientTeamsAssertion),
}

#[derive(Debug, Error)]
#[error("no matches supplied to the estimator")]
pub struct EmptyInputAssertion;
impl EmptyInputAssertion {
    pub fn check(matches: usize) -> Result<(), Self> {
        if matches == 0 {
            Err(Self)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Error)]
#[error("at least 2 distinct teams are required to fit, found {distinct_teams}")]
pub struct InsufficientTeamsAssertion {
    pub distinct_teams: usize,
}
impl InsufficientTeamsAssertion {
    const MIN_TEAMS: usize = 2;

    pub fn check(distinct_teams: usize) -> Result<(), Self> {
        if distinct_teams < Self::MIN_TEAMS {
            Err(Self { distinct_teams })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidDistribution(#[from] pub DistributionSumError);

#[derive(Debug, Clone)]
pub struct DistributionSumAssertion {
    pub expected: RangeInclusive<f64>,
    pub tolerance: f64,
}
impl DistributionSumAssertion {
    pub const DEFAULT_TOLERANCE: f64 = 1e-3;

    pub fn with_default_tolerance() -> Self {
        Self {
            expected: 1.0..=1.0,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }

    pub fn check(&self, sum: f64) -> Result<(), DistributionSumError> {
        if sum < *self.expected.start() - self.tolerance || sum > *self.expected.end() + self.tolerance {
            Err(DistributionSumError {
                assertion: self.clone(),
                actual: sum,
            })
        } else {
            Ok(())
        }
    }
}

impl Display for DistributionSumAssertion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ± {}", self.expected, self.tolerance)
    }
}

#[derive(Debug, Error)]
#[error("expected distribution sum in {assertion}, got {actual}")]
pub struct DistributionSumError {
    pub assertion: DistributionSumAssertion,
    pub actual: f64,
}

/// Non-fatal conditions, accumulated and returned alongside a successful
/// result rather than raised.
#[derive(Clone, Debug, Error)]
pub enum Warning {
    #[error("numerical instability in {context}: {detail}")]
    NumericalInstability { context: String, detail: String },

    #[error("collaborator {collaborator} unavailable, used neutral fallback")]
    ProviderUnavailable { collaborator: String },

    #[error("bundle under-populated: requested {requested}, produced {produced}")]
    UnderpopulatedBundle { requested: usize, produced: usize },

    #[error("match skipped during validation: {reason}")]
    MatchSkipped { reason: String },

    #[error("team {team} has zero training matches, flagged uncalibrated")]
    UncalibratedTeam { team: String },
}
