use crate::domain::errors::SimulationError;
use crate::domain::ports::RollSource;
use hmac::{Hmac, Mac};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEED_BYTES: usize = 32;
const BYTES_PER_ROLL: usize = 4;

/// Provably-fair roll generator.
///
/// Bytes come from HMAC-SHA256 keyed with the server seed over
/// `"{client_seed}:{nonce}:{round}"`. `round` counts generated 32-byte
/// blocks and never resets; the nonce advances by the number of rolls
/// drawn. Unused bytes of a block are kept for the next draw.
pub struct ProvablyFairRng {
    server_seed: String,
    client_seed: String,
    nonce: u64,
    round: u64,
    keyed: HmacSha256,
    cache: Vec<u8>,
}

impl ProvablyFairRng {
    pub fn new(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self, SimulationError> {
        let server_seed = server_seed.into();
        let keyed = HmacSha256::new_from_slice(server_seed.as_bytes())
            .map_err(|e| SimulationError::Rng(format!("invalid server seed: {e}")))?;

        Ok(Self {
            server_seed,
            client_seed: client_seed.into(),
            nonce,
            round: 0,
            keyed,
            cache: Vec::with_capacity(SEED_BYTES * 2),
        })
    }

    /// Fresh generator with 32-byte OS-random seeds and nonce 0.
    pub fn from_entropy() -> Result<Self, SimulationError> {
        let server_seed = random_seed()?;
        let client_seed = random_seed()?;
        Self::new(server_seed, client_seed, 0)
    }

    pub fn server_seed(&self) -> &str {
        &self.server_seed
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    fn push_block(&mut self) {
        let mut mac = self.keyed.clone();
        mac.update(format!("{}:{}:{}", self.client_seed, self.nonce, self.round).as_bytes());
        self.cache.extend_from_slice(&mac.finalize().into_bytes());
        self.round += 1;
    }
}

impl RollSource for ProvablyFairRng {
    fn fill_rolls(&mut self, buf: &mut Vec<f64>, count: usize) {
        if count == 0 {
            return;
        }

        let needed = count * BYTES_PER_ROLL;
        while self.cache.len() < needed {
            self.push_block();
        }

        buf.reserve(count);
        buf.extend(
            self.cache[..needed]
                .chunks_exact(BYTES_PER_ROLL)
                .map(|chunk| roll_from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
        );
        self.cache.drain(..needed);
        self.nonce += count as u64;
    }
}

/// Maps four bytes to a roll in `[0, 100.01)`.
pub fn roll_from_bytes(bytes: [u8; 4]) -> f64 {
    let fraction = bytes
        .iter()
        .zip(1..)
        .fold(0.0, |acc, (&b, power)| acc + f64::from(b) / 256f64.powi(power));
    fraction * 10001.0 / 100.0
}

fn random_seed() -> Result<String, SimulationError> {
    let mut bytes = [0u8; SEED_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SimulationError::Rng(format!("OS entropy unavailable: {e}")))?;
    Ok(hex::encode(bytes))
}
