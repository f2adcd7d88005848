//! Seeded pseudo-random number generator
//!
//! Every bot draw in a session comes from one of these, so a session can be
//! replayed exactly from its seed. Uses xorshift64*.

/// Seeded random number generator
///
/// Deterministic: same seed + stream = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and a stream index
    pub fn new(seed: &[u8; 32], stream: u32) -> Self {
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        state ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);

        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Shorthand for tests and replays that only carry a small seed
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(&bytes, 0)
    }

    /// Derive an independent RNG for one round of a session
    pub fn for_round(&self, round: u32) -> Self {
        let mut new_state = self.state;
        new_state ^= (round as u64).wrapping_mul(0x9e3779b97f4a7c15);
        if new_state == 0 {
            new_state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state: new_state };
        rng.next_u64();
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Uniform value in [0, 1), 53 bits of precision
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in [min, max]
    ///
    /// Returns `min` when the interval is empty.
    pub fn next_between(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        (min + self.next_unit() * (max - min)).min(max)
    }

    /// `floor(random() * max)`, a value in [0, max), 0 when max is 0
    pub fn next_scaled(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        let value = (self.next_unit() * max as f64).floor() as u64;
        value.min(max - 1)
    }
}
