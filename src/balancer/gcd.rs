//! Greatest-common-divisor helpers for the weight ladder.

use super::InstanceInfo;

/// Greatest common divisor of `x` and `y` (Euclidean remainder algorithm).
///
/// The loop stops on a zero remainder, so `gcd(x, 0) == x` and no division
/// by zero can happen.
pub fn gcd(mut x: u32, mut y: u32) -> u32 {
    while y != 0 {
        let t = x % y;
        x = y;
        y = t;
    }
    x
}

/// GCD of every weight in `instances`, folded left to right.
///
/// Zero weights are neutral. Returns 0 only when all weights are 0
/// (or the slice is empty).
pub fn gcd_of_weights(instances: &[InstanceInfo]) -> u32 {
    instances.iter().fold(0, |acc, i| gcd(acc, i.weight))
}

/// Largest weight in `instances`, 0 for an empty slice.
pub fn max_weight(instances: &[InstanceInfo]) -> u32 {
    instances.iter().map(|i| i.weight).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(weights: &[u32]) -> Vec<InstanceInfo> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| InstanceInfo::new("svc", format!("10.0.0.{}:80", i + 1), *w))
            .collect()
    }

    #[test]
    fn test_gcd_basic() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(8, 12), 4);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(100, 100), 100);
    }

    #[test]
    fn test_gcd_zero_operand() {
        assert_eq!(gcd(5, 0), 5);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(0, 0), 0);
    }

    #[test]
    fn test_gcd_of_weights() {
        assert_eq!(gcd_of_weights(&weighted(&[2, 4, 8])), 2);
        assert_eq!(gcd_of_weights(&weighted(&[5, 1, 1])), 1);
        assert_eq!(gcd_of_weights(&weighted(&[100, 200, 300])), 100);
    }

    #[test]
    fn test_gcd_of_weights_ignores_zeros() {
        assert_eq!(gcd_of_weights(&weighted(&[0, 6, 0, 9])), 3);
        assert_eq!(gcd_of_weights(&weighted(&[0, 0, 0])), 0);
        assert_eq!(gcd_of_weights(&[]), 0);
    }

    #[test]
    fn test_max_weight() {
        assert_eq!(max_weight(&weighted(&[3, 9, 1])), 9);
        assert_eq!(max_weight(&weighted(&[0, 0])), 0);
        assert_eq!(max_weight(&[]), 0);
    }
}
