//! A lazy random permutation of every pixel in a rectangle.
//!
//! Progressive rendering looks best when pixels arrive scattered over
//! the whole image rather than scanline by scanline.  Shuffling a list
//! of every coordinate would work but costs memory proportional to the
//! image; instead a counter is run through a keyed Feistel network,
//! which is a bijection on a power-of-two domain.  Counter values
//! whose image falls outside the rectangle are skipped, so every pixel
//! is produced exactly once and the domain is never more than four
//! times larger than the rectangle.

use rand::Rng;

const ROUNDS: usize = 4;

/// Every `(x, y)` with `x < width` and `y < height`, each exactly once,
/// in an order fixed by the keys drawn at construction or restart.
#[derive(Clone, Debug)]
pub struct DissolvePattern {
    width: usize,
    height: usize,
    half_bits: u32,
    keys: [u32; ROUNDS],
    counter: u64,
    emitted: usize,
}

impl DissolvePattern {
    /// A fresh permutation of the `width × height` grid, keyed from `rng`.
    pub fn new<R: Rng>(width: usize, height: usize, rng: &mut R) -> Self {
        let total = (width as u64) * (height as u64);
        // Smallest even bit count whose domain covers every pixel.
        let mut half_bits = 1;
        while (1u64 << (2 * half_bits)) < total {
            half_bits += 1;
        }
        let mut pattern = DissolvePattern {
            width,
            height,
            half_bits,
            keys: [0; ROUNDS],
            counter: 0,
            emitted: 0,
        };
        pattern.restart(rng);
        pattern
    }

    /// Start over with a new order.
    pub fn restart<R: Rng>(&mut self, rng: &mut R) {
        for key in self.keys.iter_mut() {
            *key = rng.gen();
        }
        self.rewind();
    }

    /// Start over with the same order.
    pub fn rewind(&mut self) {
        self.counter = 0;
        self.emitted = 0;
    }

    /// Number of coordinates in a complete pass.
    pub fn total(&self) -> usize {
        self.width * self.height
    }

    /// Number of coordinates produced so far in this pass.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn domain(&self) -> u64 {
        1u64 << (2 * self.half_bits)
    }

    fn permute(&self, value: u64) -> u64 {
        let mask = (1u64 << self.half_bits) - 1;
        let mut left = value >> self.half_bits;
        let mut right = value & mask;
        for &key in &self.keys {
            let mixed = round(right, key) & mask;
            let next = left ^ mixed;
            left = right;
            right = next;
        }
        (left << self.half_bits) | right
    }
}

fn round(value: u64, key: u32) -> u64 {
    let mut h = (value ^ u64::from(key)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= h >> 29;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^ (h >> 32)
}

impl Iterator for DissolvePattern {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        let total = self.total() as u64;
        if self.emitted as u64 >= total {
            return None;
        }
        while self.counter < self.domain() {
            let index = self.permute(self.counter);
            self.counter += 1;
            if index < total {
                self.emitted += 1;
                let index = index as usize;
                return Some((index % self.width, index / self.width));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.emitted;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DissolvePattern {}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn covers_exactly(width: usize, height: usize) {
        let mut rng = StdRng::seed_from_u64(7);
        let pattern = DissolvePattern::new(width, height, &mut rng);
        assert_eq!(pattern.len(), width * height);
        let seen: Vec<(usize, usize)> = pattern.collect();
        assert_eq!(seen.len(), width * height);
        let unique: HashSet<(usize, usize)> = seen.iter().cloned().collect();
        assert_eq!(unique.len(), width * height);
        for (x, y) in iproduct!(0..width, 0..height) {
            assert!(unique.contains(&(x, y)));
        }
    }

    #[test]
    fn visits_every_pixel_once() {
        covers_exactly(1, 1);
        covers_exactly(7, 3);
        covers_exactly(1, 17);
        covers_exactly(64, 48);
        covers_exactly(33, 65);
    }

    #[test]
    fn empty_regions_produce_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(DissolvePattern::new(0, 5, &mut rng).count(), 0);
    }

    #[test]
    fn order_is_shuffled() {
        let mut rng = StdRng::seed_from_u64(3);
        let order: Vec<(usize, usize)> = DissolvePattern::new(16, 16, &mut rng).collect();
        let scan: Vec<(usize, usize)> = iproduct!(0..16, 0..16).map(|(y, x)| (x, y)).collect();
        assert_ne!(order, scan);
    }

    #[test]
    fn same_seed_same_order() {
        let a: Vec<_> = DissolvePattern::new(9, 11, &mut StdRng::seed_from_u64(42)).collect();
        let b: Vec<_> = DissolvePattern::new(9, 11, &mut StdRng::seed_from_u64(42)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn restart_gives_a_fresh_complete_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut pattern = DissolvePattern::new(20, 20, &mut rng);
        let first: Vec<_> = pattern.by_ref().collect();
        assert_eq!(pattern.next(), None);

        pattern.restart(&mut rng);
        let second: Vec<_> = pattern.by_ref().collect();
        assert_eq!(second.len(), 400);
        assert_ne!(first, second);
        let a: HashSet<_> = first.into_iter().collect();
        let b: HashSet<_> = second.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn rewind_replays_the_same_order() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pattern = DissolvePattern::new(6, 4, &mut rng);
        let head: Vec<_> = pattern.by_ref().take(10).collect();
        assert_eq!(pattern.emitted(), 10);
        assert_eq!(pattern.len(), 14);
        pattern.rewind();
        let again: Vec<_> = pattern.take(10).collect();
        assert_eq!(head, again);
    }
}
