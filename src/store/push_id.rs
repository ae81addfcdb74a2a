//! Push keys: 20-character record keys that sort by creation time.
//!
//! The first 8 characters encode the creation time in milliseconds, the last 12
//! are random. Keys minted in the same millisecond increment the random part, so
//! keys from one generator are strictly increasing and never repeat.

use rand::Rng;
use std::sync::{Mutex, PoisonError};

/// Alphabet in ASCII order so that string order matches numeric order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_LEN: usize = 8;
const RAND_LEN: usize = 12;

#[derive(Debug, Default)]
struct State {
    last_time: i64,
    last_rand: [u8; RAND_LEN],
}

/// Generates push keys. One generator per store keeps keys ordered.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

impl PushIdGenerator {
    /// Creates a generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a key for the current wall-clock time.
    pub fn next_id(&self) -> String {
        self.next_id_at(chrono::Utc::now().timestamp_millis())
    }

    /// Mints a key for `now_ms`. A clock that moves backwards is treated as
    /// standing still so ordering is preserved.
    pub fn next_id_at(&self, now_ms: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = now_ms.max(state.last_time);

        if now == state.last_time && !increment(&mut state.last_rand) {
            // Random part exhausted for this millisecond; borrow the next one.
            now += 1;
        }
        if now != state.last_time {
            let mut rng = rand::thread_rng();
            for slot in &mut state.last_rand {
                *slot = rng.gen_range(0..64);
            }
        }
        state.last_time = now;

        let mut id = String::with_capacity(TIME_LEN + RAND_LEN);
        let mut time_chars = [0u8; TIME_LEN];
        let mut remaining = now;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[usize::try_from(remaining.rem_euclid(64)).unwrap_or(0)];
            remaining = remaining.div_euclid(64);
        }
        id.extend(time_chars.iter().map(|&c| char::from(c)));
        id.extend(
            state
                .last_rand
                .iter()
                .map(|&digit| char::from(PUSH_CHARS[usize::from(digit)])),
        );
        id
    }
}

/// Adds one to a base-64 digit string. Returns false on overflow.
fn increment(digits: &mut [u8; RAND_LEN]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_id_shape() {
        let generator = PushIdGenerator::new();
        let id = generator.next_id();
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_push_ids_strictly_increase_within_one_millisecond() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..500).map(|_| generator.next_id_at(1_700_000_000_000)).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_push_ids_follow_time_and_survive_clock_skew() {
        let generator = PushIdGenerator::new();
        let early = generator.next_id_at(1_000);
        let later = generator.next_id_at(2_000);
        let skewed = generator.next_id_at(500);
        assert!(early < later);
        assert!(later < skewed);
        assert_eq!(&later[..TIME_LEN], &skewed[..TIME_LEN]);
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; RAND_LEN];
        digits[RAND_LEN - 1] = 63;
        assert!(increment(&mut digits));
        assert_eq!(digits[RAND_LEN - 1], 0);
        assert_eq!(digits[RAND_LEN - 2], 1);

        let mut full = [63u8; RAND_LEN];
        assert!(!increment(&mut full));
    }
}
