//! Deterministic random streams and the dice abstraction used by combat.

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Source of dice rolls and percentile draws.
///
/// Every `Rng` is a `Roller`; tests can supply a scripted implementation to
/// pin down an exact sequence of outcomes.
pub trait Roller {
    /// Uniform integer in `1..=sides`.
    fn die(&mut self, sides: u32) -> u32;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Sum of `count` rolls of a `sides`-sided die.
    fn dice(&mut self, count: u32, sides: u32) -> u32 {
        (0..count).map(|_| self.die(sides)).sum()
    }

    /// Uniform float in `[0, 100)`.
    fn percent(&mut self) -> f64 {
        self.unit() * 100.0
    }
}

impl<R: Rng> Roller for R {
    fn die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides.max(1))
    }

    fn unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    scenes: CountingRng<SmallRng>,
    actions: CountingRng<SmallRng>,
    combat: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            scenes: CountingRng::new(derive_stream_seed(seed, b"scenes")),
            actions: CountingRng::new(derive_stream_seed(seed, b"actions")),
            combat: CountingRng::new(derive_stream_seed(seed, b"combat")),
        }
    }

    /// Rebuild a bundle at the position recorded by [`RngBundle::cursor`].
    #[must_use]
    pub fn resume(cursor: RngCursor) -> Self {
        let mut bundle = Self::from_user_seed(cursor.seed);
        bundle.scenes.skip(cursor.scenes);
        bundle.actions.skip(cursor.actions);
        bundle.combat.skip(cursor.combat);
        bundle
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Where each stream currently stands.
    #[must_use]
    pub const fn cursor(&self) -> RngCursor {
        RngCursor {
            seed: self.seed,
            scenes: self.scenes.draws(),
            actions: self.actions.draws(),
            combat: self.combat.draws(),
        }
    }

    /// Access the scene selection stream.
    pub fn scenes(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.scenes
    }

    /// Access the action resolution stream.
    pub fn actions(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.actions
    }

    /// Access the combat stream.
    pub fn combat(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.combat
    }

    /// Total draws across every stream.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.scenes
            .draws()
            .saturating_add(self.actions.draws())
            .saturating_add(self.combat.draws())
    }
}

/// Seed plus per-stream draw counts; enough to resume a bundle mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RngCursor {
    pub seed: u64,
    pub scenes: u64,
    pub actions: u64,
    pub combat: u64,
}

/// Counting wrapper for RNG streams providing instrumentation.
///
/// One draw is one 64-bit step of the wrapped generator, so replaying
/// `draws` words lands a fresh stream on the same position.
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

impl<R: RngCore> CountingRng<R> {
    /// Number of draws performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn skip(&mut self, draws: u64) {
        for _ in 0..draws {
            self.next_u64();
        }
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(words_for(dest.len()));
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(words_for(dest.len()));
        self.rng.try_fill_bytes(dest)
    }
}

fn words_for(bytes: usize) -> u64 {
    u64::try_from(bytes.div_ceil(8)).unwrap_or(u64::MAX)
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
