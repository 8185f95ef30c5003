use rand_core::{impls, Error as RandError, OsRng, RngCore};

use crate::config::{SpeedTiers, TrackerConfig};
use crate::models::UnitStatus;

/// Decides the initial kinematics of a newly observed unit.
pub trait SpeedPolicy {
    /// `batch_index` is the unit's position in the delivery that first
    /// contained it.
    fn speed_for(&mut self, batch_index: usize, status: UnitStatus) -> f64;

    /// Starting segment in `0..segment_count`. `segment_count` is at least 1.
    fn start_segment(&mut self, segment_count: usize) -> usize {
        let _ = segment_count;
        0
    }
}

/// Fast / slow / very-slow tiers with a uniform draw for everyone else.
pub struct TieredSpeedPolicy<R = SplitMix64> {
    tiers: SpeedTiers,
    randomize_start: bool,
    rng: R,
}

impl TieredSpeedPolicy<SplitMix64> {
    pub fn seeded(tiers: SpeedTiers, seed: u64, randomize_start: bool) -> Self {
        Self::with_rng(tiers, SplitMix64::new(seed), randomize_start)
    }

    /// Test mode (or an explicit seed) gives a reproducible policy; otherwise
    /// the generator is seeded from the OS.
    pub fn from_config(config: &TrackerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| OsRng.next_u64());
        Self::seeded(config.speeds, seed, config.randomize_start())
    }
}

impl<R: RngCore> TieredSpeedPolicy<R> {
    pub fn with_rng(tiers: SpeedTiers, rng: R, randomize_start: bool) -> Self {
        Self {
            tiers,
            randomize_start,
            rng,
        }
    }

    pub fn tiers(&self) -> &SpeedTiers {
        &self.tiers
    }

    fn unit_interval(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl<R: RngCore> SpeedPolicy for TieredSpeedPolicy<R> {
    fn speed_for(&mut self, batch_index: usize, status: UnitStatus) -> f64 {
        if status == UnitStatus::Offline {
            return 0.0;
        }
        match batch_index {
            0 => self.tiers.fast,
            1 => self.tiers.slow,
            _ if status == UnitStatus::Maintenance => self.tiers.very_slow,
            _ => {
                let span = self.tiers.random_max - self.tiers.random_min;
                self.tiers.random_min + self.unit_interval() * span
            }
        }
    }

    fn start_segment(&mut self, segment_count: usize) -> usize {
        if !self.randomize_start || segment_count <= 1 {
            return 0;
        }
        (self.rng.next_u64() % segment_count as u64) as usize
    }
}

/// Returns the same speed for every non-offline unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSpeedPolicy(pub f64);

impl SpeedPolicy for FixedSpeedPolicy {
    fn speed_for(&mut self, _batch_index: usize, status: UnitStatus) -> f64 {
        if status == UnitStatus::Offline {
            0.0
        } else {
            self.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut x = self.state;
        x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^ (x >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}
