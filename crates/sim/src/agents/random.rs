use quadsim_shared::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::agent::Agent;

/// Uniform random actions in [-1, 1]². Baseline for evaluation tables.
pub struct RandomAgent {
    rng: Pcg64,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _obs: &Observation) -> Action {
        Action {
            collective: self.rng.gen_range(-1.0..=1.0),
            differential: self.rng.gen_range(-1.0..=1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_in_range_and_seeded() {
        let mut a = RandomAgent::new(11);
        let mut b = RandomAgent::new(11);
        let obs = Observation::zeros();
        for _ in 0..200 {
            let x = a.act(&obs);
            assert_eq!(x, b.act(&obs));
            assert!((-1.0..=1.0).contains(&x.collective));
            assert!((-1.0..=1.0).contains(&x.differential));
        }
    }
}
