//! Smoothed weighted round-robin.
//!
//! Walks the instance list with a cursor while a "current weight" rung
//! descends from the maximum weight in steps of the weights' GCD. An
//! instance is picked when its weight reaches the current rung, so over one
//! cycle every instance is chosen `weight / gcd` times, with lighter
//! instances interleaved as the rung drops.

use super::LoadBalancer;
use crate::balancer::{gcd_of_weights, max_weight, InstanceInfo};
use parking_lot::Mutex;

/// Smoothed weighted round-robin balancer for one service.
pub struct SmoothWeightedRoundRobin {
    service: String,
    state: Mutex<RotationState>,
}

/// Rotation progress, carried across calls.
#[derive(Debug, Default)]
struct RotationState {
    /// Index of the last pick; `None` before the first multi-instance call.
    cursor: Option<usize>,
    /// Current rung of the weight ladder.
    current_weight: i64,
    /// GCD of the weights seen on the last call.
    gcd: u32,
}

impl SmoothWeightedRoundRobin {
    /// Create a balancer scoped to `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            state: Mutex::new(RotationState::default()),
        }
    }

    /// Service this balancer serves.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Index of the last pick, if any.
    pub fn cursor(&self) -> Option<usize> {
        self.state.lock().cursor
    }

    /// Current rung of the weight ladder.
    pub fn current_weight(&self) -> i64 {
        self.state.lock().current_weight
    }

    /// GCD cached from the last multi-instance call.
    pub fn cached_gcd(&self) -> u32 {
        self.state.lock().gcd
    }
}

impl LoadBalancer for SmoothWeightedRoundRobin {
    fn name(&self) -> &'static str {
        "smooth_weighted_round_robin"
    }

    fn select<'a>(&self, instances: &'a [InstanceInfo]) -> Option<&'a InstanceInfo> {
        match instances.len() {
            0 => return None,
            1 => return instances.first(),
            _ => {}
        }

        let mut state = self.state.lock();
        state.gcd = gcd_of_weights(instances);

        // All weights are zero: a leftover positive rung would never decay.
        if state.gcd == 0 {
            return None;
        }

        let step = i64::from(state.gcd);
        let len = instances.len();

        loop {
            let cursor = state.cursor.map_or(0, |c| (c + 1) % len);
            state.cursor = Some(cursor);

            if cursor == 0 {
                state.current_weight -= step;
                if state.current_weight <= 0 {
                    let max = max_weight(instances);
                    if max == 0 {
                        return None;
                    }
                    state.current_weight = i64::from(max);
                }
            }

            let candidate = &instances[cursor];
            if i64::from(candidate.weight) >= state.current_weight {
                return Some(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_instances(weights: &[u32]) -> Vec<InstanceInfo> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| InstanceInfo::new("svc", format!("127.0.0.1:{}", 8001 + i), *w))
            .collect()
    }

    fn pick_indices(lb: &SmoothWeightedRoundRobin, instances: &[InstanceInfo], n: usize) -> Vec<usize> {
        (0..n)
            .map(|_| {
                let picked = lb.select(instances).unwrap();
                instances.iter().position(|i| i == picked).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_returns_none() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        assert!(lb.select(&[]).is_none());
        assert_eq!(lb.cursor(), None);
    }

    #[test]
    fn test_single_instance_leaves_state_untouched() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[7]);

        for _ in 0..5 {
            assert_eq!(lb.select(&instances), Some(&instances[0]));
        }

        assert_eq!(lb.cursor(), None);
        assert_eq!(lb.current_weight(), 0);
        assert_eq!(lb.cached_gcd(), 0);
    }

    #[test]
    fn test_single_zero_weight_instance_is_returned() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[0]);
        assert_eq!(lb.select(&instances), Some(&instances[0]));
    }

    #[test]
    fn test_all_zero_weights() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[0, 0, 0]);
        assert!(lb.select(&instances).is_none());
        assert!(lb.select(&instances).is_none());
    }

    #[test]
    fn test_all_zero_after_positive_rung() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let weighted = test_instances(&[5, 1]);
        lb.select(&weighted).unwrap();
        assert_eq!(lb.current_weight(), 5);

        let zeros = test_instances(&[0, 0]);
        assert!(lb.select(&zeros).is_none());
    }

    #[test]
    fn test_weighted_cycle_5_1_1() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[5, 1, 1]);

        let picks = pick_indices(&lb, &instances, 7);
        assert_eq!(picks, vec![0, 0, 0, 0, 0, 1, 2]);

        // Next cycle repeats
        let picks = pick_indices(&lb, &instances, 7);
        assert_eq!(picks, vec![0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_gcd_reduces_cycle() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[2, 4, 8]);

        let picks = pick_indices(&lb, &instances, 7);
        assert_eq!(lb.cached_gcd(), 2);
        assert_eq!(picks, vec![2, 2, 1, 2, 0, 1, 2]);

        let mut counts = [0usize; 3];
        for idx in pick_indices(&lb, &instances, 700) {
            counts[idx] += 1;
        }
        assert_eq!(counts, [100, 200, 400]);
    }

    #[test]
    fn test_interleaves_as_rung_descends() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[4, 2, 1]);

        let picks = pick_indices(&lb, &instances, 7);
        assert_eq!(picks, vec![0, 0, 0, 1, 0, 1, 2]);
    }

    #[test]
    fn test_uniform_weights_cycle() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[3, 3, 3]);

        let picks = pick_indices(&lb, &instances, 6);
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let instances = test_instances(&[2, 0, 1]);

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for idx in pick_indices(&lb, &instances, 30) {
            *counts.entry(idx).or_default() += 1;
        }

        assert_eq!(counts.get(&0), Some(&20));
        assert_eq!(counts.get(&1), None);
        assert_eq!(counts.get(&2), Some(&10));
    }

    #[test]
    fn test_shrinking_list_stays_in_range() {
        let lb = SmoothWeightedRoundRobin::new("svc");
        let large = test_instances(&[1, 1, 1, 1, 1]);
        for _ in 0..4 {
            lb.select(&large).unwrap();
        }
        assert_eq!(lb.cursor(), Some(3));

        let small = test_instances(&[1, 1]);
        for _ in 0..10 {
            let picked = lb.select(&small).unwrap();
            assert!(small.contains(picked));
            assert!(lb.cursor().unwrap() < small.len());
        }
    }
}
