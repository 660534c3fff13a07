use crate::domain::errors::SimulationError;
use crate::domain::ports::RollSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROLL_SCALE: f64 = 100.01;

/// Uniform rolls from a seeded PRNG. Not verifiable, but much cheaper
/// than hashing a block per eight rolls.
pub struct FastRng {
    rng: StdRng,
    nonce: u64,
}

impl FastRng {
    pub fn from_entropy() -> Result<Self, SimulationError> {
        let rng = StdRng::try_from_os_rng()
            .map_err(|e| SimulationError::Rng(format!("OS entropy unavailable: {e}")))?;
        Ok(Self { rng, nonce: 0 })
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            nonce: 0,
        }
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

impl RollSource for FastRng {
    fn fill_rolls(&mut self, buf: &mut Vec<f64>, count: usize) {
        buf.reserve(count);
        for _ in 0..count {
            buf.push(self.rng.random::<f64>() * ROLL_SCALE);
        }
        self.nonce += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolls_in_range() {
        let mut rng = FastRng::seeded(7);
        let rolls = rng.next_rolls(10_000);
        assert_eq!(rolls.len(), 10_000);
        assert!(rolls.iter().all(|r| (0.0..ROLL_SCALE).contains(r)));
        assert_eq!(rng.nonce(), 10_000);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = FastRng::seeded(42).next_rolls(16);
        let b = FastRng::seeded(42).next_rolls(16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_roughly_uniform() {
        let mut rng = FastRng::seeded(1);
        let rolls = rng.next_rolls(20_000);
        let below_half = rolls.iter().filter(|&&r| r < 50.0).count() as f64;
        let share = below_half / rolls.len() as f64;
        assert!((share - 0.5).abs() < 0.02, "share {share}");
    }
}
