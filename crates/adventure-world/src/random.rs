//! Splittable, serializable random streams.
//!
//! Wraps `ChaCha8Rng`, whose output is identical on every platform, so a
//! stream restored from a save continues exactly where it stopped.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const KEY_LEN: usize = 32;
const STATE_LEN: usize = KEY_LEN + 8 + 16;

#[derive(Debug, Error)]
pub enum RandomStateError {
    #[error("random state is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("random state is {0} bytes long, expected {STATE_LEN}")]
    Length(usize),
}

/// A snapshot of a [`RandomStream`]: key, stream id and word position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomState {
    key: [u8; KEY_LEN],
    stream: u64,
    word_pos: u128,
}

impl RandomState {
    /// Base64 of `key ‖ stream_le ‖ word_pos_le`.
    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(STATE_LEN);
        bytes.extend_from_slice(&self.key);
        bytes.extend_from_slice(&self.stream.to_le_bytes());
        bytes.extend_from_slice(&self.word_pos.to_le_bytes());
        STANDARD.encode(bytes)
    }

    pub fn decode(text: &str) -> Result<Self, RandomStateError> {
        let bytes = STANDARD.decode(text.trim())?;
        if bytes.len() != STATE_LEN {
            return Err(RandomStateError::Length(bytes.len()));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes[..KEY_LEN]);
        let mut stream = [0u8; 8];
        stream.copy_from_slice(&bytes[KEY_LEN..KEY_LEN + 8]);
        let mut word_pos = [0u8; 16];
        word_pos.copy_from_slice(&bytes[KEY_LEN + 8..]);
        Ok(Self {
            key,
            stream: u64::from_le_bytes(stream),
            word_pos: u128::from_le_bytes(word_pos),
        })
    }

    pub fn to_stream(&self) -> RandomStream {
        let mut rng = ChaCha8Rng::from_seed(self.key);
        rng.set_stream(self.stream);
        rng.set_word_pos(self.word_pos);
        RandomStream { rng }
    }
}

impl Serialize for RandomState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for RandomState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(serde::de::Error::custom)
    }
}

/// A deterministic pseudo-random stream with a single owner.
///
/// Not `Clone`: two holders drawing from copies of the same stream would
/// silently produce duplicate content. Use [`split`](Self::split) for an
/// independent child, or [`state`](Self::state) for a snapshot.
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A new stream seeded from this one's next draws. Advances `self`.
    pub fn split(&mut self) -> Self {
        let mut key = [0u8; KEY_LEN];
        self.rng.fill_bytes(&mut key);
        Self {
            rng: ChaCha8Rng::from_seed(key),
        }
    }

    pub fn state(&self) -> RandomState {
        RandomState {
            key: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.gen_range(range)
    }

    /// Pick an index with probability proportional to its weight.
    /// An all-zero table picks index 0.
    pub fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        if total == 0 {
            return 0;
        }
        let mut roll = self.rng.gen_range(0..total);
        for (index, &weight) in weights.iter().enumerate() {
            if roll < weight as u64 {
                return index;
            }
            roll -= weight as u64;
        }
        weights.len() - 1
    }
}

impl PartialEq for RandomStream {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

impl Eq for RandomStream {}

impl fmt::Debug for RandomStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomStream")
            .field("stream", &self.rng.get_stream())
            .field("word_pos", &self.rng.get_word_pos())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomStream::from_seed(42);
        let mut b = RandomStream::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn restored_state_continues_sequence() {
        let mut original = RandomStream::from_seed(7);
        for _ in 0..13 {
            original.next_u64();
        }
        let encoded = original.state().encode();
        let mut restored = RandomState::decode(&encoded).unwrap().to_stream();
        assert_eq!(restored, original);
        for _ in 0..50 {
            assert_eq!(restored.next_u64(), original.next_u64());
        }
    }

    #[test]
    fn split_is_independent_and_deterministic() {
        let mut parent_a = RandomStream::from_seed(1);
        let mut parent_b = RandomStream::from_seed(1);
        let mut child_a = parent_a.split();
        let mut child_b = parent_b.split();
        assert_eq!(child_a.next_u64(), child_b.next_u64());
        assert_ne!(child_a, parent_a);

        let mut fresh = RandomStream::from_seed(1);
        assert_ne!(child_a.next_u64(), fresh.next_u64());
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(matches!(
            RandomState::decode("not base64!"),
            Err(RandomStateError::Encoding(_))
        ));
        assert!(matches!(
            RandomState::decode(&STANDARD.encode([1u8, 2, 3])),
            Err(RandomStateError::Length(3))
        ));
    }

    #[test]
    fn weighted_index_respects_zero_weights() {
        let mut random = RandomStream::from_seed(3);
        for _ in 0..200 {
            let index = random.weighted_index(&[0, 5, 0, 1]);
            assert!(index == 1 || index == 3);
        }
        assert_eq!(random.weighted_index(&[0, 0]), 0);
    }

    #[test]
    fn weighted_index_roughly_follows_weights() {
        let mut random = RandomStream::from_seed(99);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[random.weighted_index(&[3, 1])] += 1;
        }
        assert!(counts[0] > 6_500 && counts[0] < 8_500, "counts: {counts:?}");
    }

    #[test]
    fn state_serializes_as_string() {
        let state = RandomStream::from_seed(5).state();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.is_string());
        let back: RandomState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
