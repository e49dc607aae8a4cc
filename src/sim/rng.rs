/// Seedable random source owned by one game.
///
/// Wraps `StdRng` so a run can be replayed from its seed (`--seed`), and
/// forwards `RngCore` so placement code can take any `rand::Rng`.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

pub struct SessionRng {
    rng: StdRng,
    seed: u64,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_random() -> Self {
        let seed: u64 = rand::rng().random();
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for SessionRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.rng.fill_bytes(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SessionRng::new(42);
        let mut b = SessionRng::new(42);
        let xs: Vec<u32> = (0..8).map(|_| a.random_range(0..1000)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.random_range(0..1000)).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.seed(), 42);
    }
}
