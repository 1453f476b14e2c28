//! # DockMock Identifier Generation
//!
//! File: cli/src/common/ids.rs
//! Author: Christi Mahu
//!
//! Container identifiers are opaque to the engine; it only needs them to be
//! unique. `RandomIds` mimics the daemon (64 lowercase hex characters, 12 for
//! short ids). `SequentialIds` yields predictable ids for tests that want to
//! assert on them.
//!
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

const HEX: &[u8] = b"0123456789abcdef";
const LONG_ID_LEN: usize = 64;
const SHORT_ID_LEN: usize = 12;

/// Source of new container identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random hex identifiers, shaped like the daemon's.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds {
    pub short: bool,
}

impl IdGenerator for RandomIds {
    fn generate(&self) -> String {
        let len = if self.short { SHORT_ID_LEN } else { LONG_ID_LEN };
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
            .collect()
    }
}

/// Deterministic ids: `000…001`, `000…002`, … (64 hex chars).
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{:0width$x}", n, width = LONG_ID_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_hex_of_expected_length() {
        let long = RandomIds::default().generate();
        assert_eq!(long.len(), 64);
        assert!(long.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let short = RandomIds { short: true }.generate();
        assert_eq!(short.len(), 12);
    }

    #[test]
    fn test_random_ids_differ() {
        let ids = RandomIds::default();
        assert_ne!(ids.generate(), ids.generate());
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::default();
        let first = ids.generate();
        let second = ids.generate();
        assert_eq!(first.len(), 64);
        assert!(first.ends_with("01"));
        assert!(second.ends_with("02"));
    }
}
