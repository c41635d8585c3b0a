// Shared credential pool with deterministic round-robin failover
//
// The pool is an ordered, immutable list of interchangeable API credentials.
// Selection is a pure function of (slice index, attempt number), so the pool
// can be shared read-only across every in-flight dispatch with no locking:
// slice i, attempt a uses credential (i + a) mod K. The offset by slice index
// spreads first attempts evenly across the pool instead of hot-spotting
// credential 0 when most slices succeed immediately.

use crate::core::errors::ConfigError;

pub struct CredentialPool {
    credentials: Vec<String>,
}

impl CredentialPool {
    /// Build a pool from an ordered credential list. Fails if the list is
    /// empty; a pool of one is fine (failover degenerates to a single try).
    pub fn new(credentials: Vec<String>) -> Result<Self, ConfigError> {
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(Self { credentials })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Pool index selected for the given slice and attempt.
    pub fn index_for(&self, slice_index: usize, attempt: usize) -> usize {
        (slice_index + attempt) % self.credentials.len()
    }

    /// Credential for the given slice and attempt. A failed credential stays
    /// in the pool and may be handed out again for a later slice.
    pub fn credential_for(&self, slice_index: usize, attempt: usize) -> &str {
        &self.credentials[self.index_for(slice_index, attempt)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> CredentialPool {
        CredentialPool::new((0..n).map(|i| format!("key{}", i)).collect()).unwrap()
    }

    #[test]
    fn empty_pool_rejected() {
        assert!(matches!(
            CredentialPool::new(Vec::new()),
            Err(ConfigError::NoCredentials)
        ));
    }

    #[test]
    fn selection_is_offset_round_robin() {
        let pool = pool(3);
        for slice in 0..7 {
            for attempt in 0..5 {
                assert_eq!(
                    pool.credential_for(slice, attempt),
                    format!("key{}", (slice + attempt) % 3)
                );
            }
        }
    }

    #[test]
    fn first_attempts_spread_across_pool() {
        let pool = pool(2);
        // Slice 0 starts on key0, slice 1 starts on key1; slice 1's second
        // attempt wraps back to key0.
        assert_eq!(pool.credential_for(0, 0), "key0");
        assert_eq!(pool.credential_for(1, 0), "key1");
        assert_eq!(pool.credential_for(1, 1), "key0");
    }

    #[test]
    fn index_and_credential_agree() {
        let pool = pool(3);
        for slice in 0..6 {
            for attempt in 0..4 {
                let index = pool.index_for(slice, attempt);
                assert_eq!(
                    pool.credential_for(slice, attempt),
                    format!("key{}", index)
                );
            }
        }
    }

    #[test]
    fn single_credential_pool_always_selects_it() {
        let pool = pool(1);
        assert_eq!(pool.credential_for(9, 4), "key0");
    }
}
