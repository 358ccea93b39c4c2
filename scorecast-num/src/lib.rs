//! Numeric building blocks shared across the ratings engine: Poisson kernels,
//! factorial lookups, a flat matrix type, slice-probability helpers and a
//! derivative-free univariate optimiser.

#![allow(clippy::too_many_arguments)]

pub mod factorial;
pub mod linear;
pub mod opt;
pub mod poisson;
pub mod probs;
