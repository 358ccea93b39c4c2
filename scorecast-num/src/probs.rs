//! Utilities for working with probabilities.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn mean(&self) -> f64;
    fn variance(&self) -> f64;
    fn stdev(&self) -> f64;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        self.scale(target / sum);
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    fn mean(&self) -> f64 {
        self.sum() / self.len() as f64
    }

    fn variance(&self) -> f64 {
        let mean = self.mean();
        let sum_of_squares: f64 = self.iter().map(|sample| (sample - mean).powi(2)).sum();
        sum_of_squares / (self.len() - 1) as f64
    }

    fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use scorecast_testing::assert_slice_f64_near;
    use super::*;

    #[test]
    fn sum() {
        let data = [0.0, 0.1, 0.2];
        assert_f64_near!(0.3, data.sum(), 1);
    }

    #[test]
    fn mean() {
        let data = [0.05, 0.1, 0.15, 0.2];
        assert_f64_near!(0.125, data.mean());
    }

    #[test]
    fn variance() {
        let data = [0.05, 0.1, 0.15, 0.2];
        assert_float_relative_eq!(0.00416667, data.variance(), 1e-6);
    }

    #[test]
    fn normalise() {
        let mut data = [0.05, 0.1, 0.15, 0.2];
        let sum = data.normalise(1.0);
        assert_f64_near!(0.5, sum, 1);
        assert_slice_f64_near(&[0.1, 0.2, 0.3, 0.4], &data, 1);
    }
}
