//! Identity minting for Parlor participants.
//!
//! Display names are `"UserN"` with N starting at 1 and strictly increasing
//! for the lifetime of the process. The counter is never reset or reused, so
//! names cannot collide.

use std::sync::atomic::{AtomicU64, Ordering};

/// A unique participant identifier.
pub type ParticipantId = u64;

/// The identity assigned to a participant at admission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Numeric identifier, unique per process lifetime.
    pub id: ParticipantId,
    /// Display name shown to other participants.
    pub name: String,
}

/// Monotonic sequence of participant identities.
///
/// Owned by the hub handle rather than held in global state; the atomic
/// counter makes minting safe across concurrent admissions.
#[derive(Debug)]
pub struct IdentitySequence {
    next: AtomicU64,
}

impl IdentitySequence {
    /// Create a sequence starting at `User1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Mint the next identity.
    #[must_use]
    pub fn mint(&self) -> Identity {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Identity {
            id,
            name: format!("User{id}"),
        }
    }
}

impl Default for IdentitySequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequence_starts_at_one() {
        let sequence = IdentitySequence::new();
        let first = sequence.mint();
        assert_eq!(first.id, 1);
        assert_eq!(first.name, "User1");

        let second = sequence.mint();
        assert_eq!(second.name, "User2");
    }

    #[test]
    fn test_concurrent_minting_is_unique() {
        let sequence = Arc::new(IdentitySequence::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sequence = Arc::clone(&sequence);
                std::thread::spawn(move || {
                    (0..100).map(|_| sequence.mint().name).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                assert!(seen.insert(name), "duplicate identity minted");
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
