//! Shared floating-point assertion helpers for tests across the workspace.

use assert_float_eq::*;

/// Asserts that two slices of `f64` are elementwise equal to within `ulps` units
/// in the last place.
pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], ulps: i64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "slice lengths differ: expected {}, actual {}",
        expected.len(),
        actual.len()
    );
    for (expected, actual) in expected.iter().zip(actual.iter()) {
        assert_f64_near!(*expected, *actual, ulps);
    }
}

/// Asserts that two slices of `f64` are elementwise equal to within a relative
/// `epsilon`.
pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "slice lengths differ: expected {}, actual {}",
        expected.len(),
        actual.len()
    );
    for (expected, actual) in expected.iter().zip(actual.iter()) {
        assert_float_relative_eq!(*expected, *actual, epsilon);
    }
}
