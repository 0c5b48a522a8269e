use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use shared::types::ServiceInstance;

/// Picks one instance out of the resolved candidates for a call
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    fn choose<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

/// Selection strategy named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancerKind {
    #[default]
    RoundRobin,
    Random,
    Weighted,
}

impl BalancerKind {
    pub fn build(self) -> Arc<dyn LoadBalancer> {
        match self {
            BalancerKind::RoundRobin => Arc::new(RoundRobin::new()),
            BalancerKind::Random => Arc::new(Random::new()),
            BalancerKind::Weighted => Arc::new(Weighted::new()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn choose<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % instances.len();
        instances.get(idx)
    }
}

#[derive(Debug)]
pub struct Random {
    rng: Mutex<StdRng>,
}

impl Random {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for Random {
    fn choose<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        let idx = self.rng.lock().gen_range(0..instances.len());
        instances.get(idx)
    }
}

/// Random choice proportional to `ServiceInstance::weight`.
/// Instances with weight 0 are never chosen.
#[derive(Debug)]
pub struct Weighted {
    rng: Mutex<StdRng>,
}

impl Weighted {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl Default for Weighted {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer for Weighted {
    fn choose<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        let total: u64 = instances.iter().map(|i| u64::from(i.weight)).sum();
        if total == 0 {
            return None;
        }

        let mut point = self.rng.lock().gen_range(0..total);
        for instance in instances {
            let weight = u64::from(instance.weight);
            if point < weight {
                return Some(instance);
            }
            point -= weight;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances(weights: &[u32]) -> Vec<ServiceInstance> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| {
                let mut instance = ServiceInstance::new(
                    "userservice",
                    format!("user-{}", i),
                    ([127, 0, 0, 1], 8081 + i as u16).into(),
                );
                instance.weight = weight;
                instance
            })
            .collect()
    }

    #[test]
    fn test_round_robin_cycles() {
        let balancer = RoundRobin::new();
        let candidates = instances(&[1, 1, 1]);

        let picked: Vec<_> = (0..6)
            .map(|_| balancer.choose(&candidates).unwrap().instance_id.clone())
            .collect();
        assert_eq!(picked, vec!["user-0", "user-1", "user-2", "user-0", "user-1", "user-2"]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(RoundRobin::new().choose(&[]).is_none());
        assert!(Random::with_seed(1).choose(&[]).is_none());
        assert!(Weighted::with_seed(1).choose(&[]).is_none());
    }

    #[test]
    fn test_random_stays_in_range() {
        let balancer = Random::with_seed(42);
        let candidates = instances(&[1, 1]);
        let mut seen = [0usize; 2];
        for _ in 0..200 {
            let chosen = balancer.choose(&candidates).unwrap();
            let idx = candidates.iter().position(|c| c == chosen).unwrap();
            seen[idx] += 1;
        }
        assert!(seen.iter().all(|&n| n > 0), "Both instances should be picked: {:?}", seen);
    }

    #[test]
    fn test_weighted_skips_zero_weight() {
        let balancer = Weighted::with_seed(7);
        let candidates = instances(&[0, 5, 0]);
        for _ in 0..100 {
            assert_eq!(balancer.choose(&candidates).unwrap().instance_id, "user-1");
        }

        assert!(balancer.choose(&instances(&[0, 0])).is_none());
    }

    #[test]
    fn test_weighted_prefers_heavier() {
        let balancer = Weighted::with_seed(3);
        let candidates = instances(&[1, 9]);
        let heavy = (0..1000)
            .filter(|_| balancer.choose(&candidates).unwrap().instance_id == "user-1")
            .count();
        assert!(heavy > 800, "Heavier instance picked {} of 1000 times", heavy);
    }

    #[test]
    fn test_kind_from_config_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: BalancerKind,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"kind":"weighted"}"#).unwrap();
        assert_eq!(parsed.kind, BalancerKind::Weighted);
    }
}
