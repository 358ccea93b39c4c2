//! Structural draw adjustment, calibration, fixture correlation, late-shock
//! detection and jackpot ticket portfolio generation.

pub mod calibration;
pub mod correlation;
pub mod draw_adjuster;
pub mod roles;
pub mod shock;
pub mod ticket_generator;
