//! Deterministic random streams for wheel content and landing selection.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

use crate::constants::{RNG_DOMAIN_CONTENT, RNG_DOMAIN_LANDING};

/// Bundle of seeded RNG streams segregated by concern, rebuilt for every run.
///
/// Content generation and landing selection draw from separate streams so a
/// change in how many draws one of them performs does not shift the other.
#[derive(Debug, Clone)]
pub struct RngBundle {
    content: CountingRng<SmallRng>,
    landing: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle for a given run of a user-visible seed.
    #[must_use]
    pub fn for_run(seed: u64, run: u32) -> Self {
        Self {
            content: CountingRng::new(derive_stream_seed(seed, run, RNG_DOMAIN_CONTENT)),
            landing: CountingRng::new(derive_stream_seed(seed, run, RNG_DOMAIN_LANDING)),
        }
    }

    /// Stream used for outcome generation and exclusive reward picks.
    pub fn content(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.content
    }

    /// Stream used to choose the landing target.
    pub fn landing(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.landing
    }

    /// Total draws performed across both streams.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.content.draws().saturating_add(self.landing.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, run: u32, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed ^ u64::from(run);
    };
    mac.update(&run.to_le_bytes());
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
