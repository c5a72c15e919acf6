//! The randomness collaborator: `rand16()` returns a non-negative 16-bit
//! integer; the evaluator reduces it modulo `n` and adds 1 for the `RND(n)`
//! builtin. `rand::rngs::ThreadRng` sits behind a trait so tests can supply
//! a deterministic sequence instead.

use rand::Rng as _;

pub trait RandomSource {
    fn rand16(&mut self) -> u16;
}

/// The process RNG, seeded from wall-clock time at startup.
/// `rand::rngs::ThreadRng` already self-seeds from the OS entropy source on
/// first use, so there's no hand-rolled time-based seed to maintain.
pub struct ThreadRandomSource {
    rng: rand::rngs::ThreadRng,
}

impl ThreadRandomSource {
    pub fn new() -> Self {
        ThreadRandomSource { rng: rand::thread_rng() }
    }
}

impl Default for ThreadRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandomSource {
    fn rand16(&mut self) -> u16 {
        self.rng.gen_range(0..=u16::MAX)
    }
}

/// A deterministic source for tests: replays a fixed value (or cycles a
/// fixed sequence) instead of drawing from the OS.
pub struct FixedRandomSource {
    sequence: Vec<u16>,
    pos: usize,
}

impl FixedRandomSource {
    pub fn new(sequence: impl Into<Vec<u16>>) -> Self {
        let sequence = sequence.into();
        assert!(!sequence.is_empty(), "FixedRandomSource needs at least one value");
        FixedRandomSource { sequence, pos: 0 }
    }
}

impl RandomSource for FixedRandomSource {
    fn rand16(&mut self) -> u16 {
        let value = self.sequence[self.pos % self.sequence.len()];
        self.pos += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_cycles() {
        let mut r = FixedRandomSource::new(vec![3, 7]);
        assert_eq!(r.rand16(), 3);
        assert_eq!(r.rand16(), 7);
        assert_eq!(r.rand16(), 3);
    }
}
