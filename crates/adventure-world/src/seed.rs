//! Chunk seed derivation.
//!
//! A chunk's random stream is seeded from the noise values at its base
//! position, so the same chunk always generates the same tiles no matter
//! when or in what order chunks are first visited.

use crate::noise::NoiseSampler;
use crate::position::Position;
use crate::random::RandomStream;

/// Decimal digits available across all channels: `u64::MAX` has 20 digits
/// and the product must stay below it.
const SEED_DIGITS: u32 = 19;

/// Digits kept from each channel value.
pub fn slot_width(channel_count: usize) -> u32 {
    if channel_count == 0 {
        return 0;
    }
    SEED_DIGITS / channel_count as u32
}

/// Seed of the chunk containing `position`.
///
/// Every channel value is scaled to an integer of [`slot_width`] digits and
/// the slots are multiplied together, then by `modifier`. A channel that
/// truncates to zero yields a zero seed; that chunk still generates normally
/// from the zero-seeded stream.
pub fn derive_chunk_seed(position: Position, sampler: &NoiseSampler, modifier: u64) -> u64 {
    let base = position.chunk_base();
    let values = sampler.sample_all(base);
    let scale = 10u64.pow(slot_width(values.len()));

    let product = values
        .iter()
        .map(|&(_, value)| (value * scale as f64) as u64)
        .fold(1u64, u64::wrapping_mul);
    product.wrapping_mul(modifier)
}

/// Fresh stream for the chunk containing `position`.
pub fn chunk_random(position: Position, sampler: &NoiseSampler, modifier: u64) -> RandomStream {
    RandomStream::from_seed(derive_chunk_seed(position, sampler, modifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseSeeds;
    use crate::position::CHUNK_SIZE;

    fn sampler(seed: u64) -> NoiseSampler {
        NoiseSampler::new(&NoiseSeeds::generate(&mut RandomStream::from_seed(seed)))
    }

    #[test]
    fn five_channels_get_three_digits() {
        assert_eq!(slot_width(5), 3);
        assert_eq!(slot_width(1), 19);
        assert_eq!(slot_width(0), 0);
    }

    #[test]
    fn seed_depends_only_on_chunk() {
        let sampler = sampler(3);
        for &(x, y) in &[(0, 0), (7, 3), (-1, -1), (123, -456)] {
            let p = Position::new(x, y);
            let base = p.chunk_base();
            assert_eq!(
                derive_chunk_seed(p, &sampler, 1),
                derive_chunk_seed(base, &sampler, 1)
            );
            assert_eq!(
                derive_chunk_seed(base.offset(CHUNK_SIZE - 1, CHUNK_SIZE - 1), &sampler, 1),
                derive_chunk_seed(base, &sampler, 1)
            );
        }
    }

    #[test]
    fn neighbouring_chunks_differ() {
        let sampler = sampler(8);
        let seeds: std::collections::BTreeSet<u64> = (0..20)
            .map(|i| derive_chunk_seed(Position::new(i * CHUNK_SIZE, 0), &sampler, 1))
            .collect();
        assert!(seeds.len() > 15, "too many collisions: {}", seeds.len());
    }

    #[test]
    fn modifier_multiplies() {
        let sampler = sampler(21);
        let p = Position::new(40, -70);
        let plain = derive_chunk_seed(p, &sampler, 1);
        assert_eq!(derive_chunk_seed(p, &sampler, 3), plain.wrapping_mul(3));
        assert_eq!(derive_chunk_seed(p, &sampler, 0), 0);
    }

    #[test]
    fn product_fits_without_wrapping() {
        let sampler = sampler(5);
        for i in -10..10 {
            let p = Position::new(i * 37, i * 91);
            let slots: Vec<u64> = sampler
                .sample_all(p.chunk_base())
                .iter()
                .map(|&(_, v)| (v * 1000.0) as u64)
                .collect();
            assert!(slots.iter().all(|&s| s <= 1000));
            let exact = slots.iter().try_fold(1u64, |acc, &s| acc.checked_mul(s));
            assert_eq!(exact, Some(derive_chunk_seed(p, &sampler, 1)));
        }
    }
}
