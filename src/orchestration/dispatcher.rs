// Resilient per-slice dispatch over a shared credential pool
//
// Each slice is an independent unit of work: its failover loop walks the
// pool starting at (slice index mod K) and gives up after K attempts. Slices
// run concurrently under a semaphore bound; outcome order is established
// structurally by join_all, so no completion-order bookkeeping is needed.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::core::types::{DispatchOutcome, SliceChunk};
use crate::middleware::CredentialPool;
use crate::services::extraction::ExtractionClient;

pub struct ResilientDispatcher<C> {
    client: Arc<C>,
    pool: Arc<CredentialPool>,
    semaphore: Arc<Semaphore>,
}

impl<C: ExtractionClient> ResilientDispatcher<C> {
    pub fn new(client: Arc<C>, pool: Arc<CredentialPool>, max_concurrent_slices: usize) -> Self {
        Self {
            client,
            pool,
            semaphore: Arc::new(Semaphore::new(max_concurrent_slices)),
        }
    }

    /// Process every chunk, returning one outcome per chunk in input order.
    ///
    /// No slice failure aborts the run; an exhausted slice yields a failure
    /// marker and the rest proceed.
    #[instrument(skip(self, chunks), fields(chunk_count = chunks.len()))]
    pub async fn process_all(&self, chunks: &[SliceChunk]) -> Result<Vec<DispatchOutcome>> {
        let outcomes = join_all(chunks.iter().map(|chunk| self.dispatch_chunk(chunk))).await;
        outcomes.into_iter().collect()
    }

    /// Failover loop for one chunk: at most one call per pool credential.
    ///
    /// Credential choice is (chunk index + attempt) mod K, so first attempts
    /// spread across the pool and retries rotate through the remainder. A
    /// failed credential stays in the pool for later slices.
    async fn dispatch_chunk(&self, chunk: &SliceChunk) -> Result<DispatchOutcome> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .context("dispatcher semaphore closed")?;

        let pool_size = self.pool.len();
        for attempt in 0..pool_size {
            let credential_index = self.pool.index_for(chunk.index, attempt);
            let credential = self.pool.credential_for(chunk.index, attempt);
            match self.client.extract(credential, chunk).await {
                Ok(records) => {
                    debug!(
                        "Slice {} extracted {} records (attempt {}/{})",
                        chunk.index,
                        records.len(),
                        attempt + 1,
                        pool_size
                    );
                    return Ok(DispatchOutcome::Extracted {
                        index: chunk.index,
                        records,
                    });
                }
                Err(e) => {
                    warn!(
                        "Slice {} attempt {}/{} failed on credential {}: {}",
                        chunk.index,
                        attempt + 1,
                        pool_size,
                        credential_index,
                        e
                    );
                }
            }
        }

        warn!(
            "Slice {} exhausted all {} credentials, continuing without it",
            chunk.index, pool_size
        );
        Ok(DispatchOutcome::Exhausted {
            index: chunk.index,
            attempts: pool_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{ExtractionError, ExtractionResult};
    use crate::core::types::{ExtractionRecord, TextCategory};
    use crate::services::transcript::aggregate;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scripted client: records every (slice, credential) call; fails either
    /// on blacklisted credentials or for whole slices.
    struct MockClient {
        calls: Mutex<Vec<(usize, String)>>,
        failing_credentials: HashSet<String>,
        failing_slices: HashSet<usize>,
    }

    impl MockClient {
        fn new(failing_credentials: &[&str], failing_slices: &[usize]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing_credentials: failing_credentials
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                failing_slices: failing_slices.iter().copied().collect(),
            }
        }

        fn calls_for(&self, slice: usize) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(i, _)| *i == slice)
                .map(|(_, c)| c.clone())
                .collect()
        }
    }

    impl ExtractionClient for MockClient {
        async fn extract(
            &self,
            credential: &str,
            chunk: &SliceChunk,
        ) -> ExtractionResult<Vec<ExtractionRecord>> {
            self.calls
                .lock()
                .unwrap()
                .push((chunk.index, credential.to_string()));

            if self.failing_slices.contains(&chunk.index)
                || self.failing_credentials.contains(credential)
            {
                return Err(ExtractionError::InvalidResponse("scripted failure".into()));
            }

            Ok(vec![ExtractionRecord {
                text: format!("slice-{}", chunk.index),
                category: TextCategory::Speech,
            }])
        }
    }

    fn chunks(n: usize) -> Vec<SliceChunk> {
        (0..n)
            .map(|index| SliceChunk {
                index,
                png_bytes: Vec::new(),
                width: 0,
                height: 0,
            })
            .collect()
    }

    fn pool(n: usize) -> Arc<CredentialPool> {
        Arc::new(CredentialPool::new((0..n).map(|i| format!("key{}", i)).collect()).unwrap())
    }

    #[tokio::test]
    async fn first_attempts_use_offset_round_robin() {
        let client = Arc::new(MockClient::new(&[], &[]));
        let dispatcher = ResilientDispatcher::new(Arc::clone(&client), pool(2), 4);

        let outcomes = dispatcher.process_all(&chunks(3)).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(client.calls_for(0), vec!["key0"]);
        assert_eq!(client.calls_for(1), vec!["key1"]);
        assert_eq!(client.calls_for(2), vec!["key0"]);
    }

    #[tokio::test]
    async fn failed_attempt_rotates_to_next_credential() {
        // Slice 1 starts on key1; when key1 fails its second attempt must be
        // (1 + 1) mod 2 = key0.
        let client = Arc::new(MockClient::new(&["key1"], &[]));
        let dispatcher = ResilientDispatcher::new(Arc::clone(&client), pool(2), 4);

        let outcomes = dispatcher.process_all(&chunks(2)).await.unwrap();

        assert_eq!(client.calls_for(1), vec!["key1", "key0"]);
        assert!(!outcomes[1].is_exhausted());
    }

    #[tokio::test]
    async fn exhausted_slice_stops_after_pool_size_attempts() {
        let client = Arc::new(MockClient::new(&[], &[1]));
        let dispatcher = ResilientDispatcher::new(Arc::clone(&client), pool(3), 4);

        let outcomes = dispatcher.process_all(&chunks(3)).await.unwrap();

        // Exactly K attempts for the doomed slice, no unbounded spinning.
        assert_eq!(client.calls_for(1).len(), 3);
        assert!(outcomes[1].is_exhausted());
        assert!(outcomes[1].records().is_empty());

        // The rest of the run is unaffected and ordered.
        assert_eq!(outcomes[0].index(), 0);
        assert_eq!(outcomes[2].index(), 2);
        assert_eq!(aggregate(&outcomes), "slice-0\nslice-2\n");
    }

    #[tokio::test]
    async fn outcome_order_matches_input_under_serial_concurrency() {
        let client = Arc::new(MockClient::new(&[], &[]));
        let dispatcher = ResilientDispatcher::new(Arc::clone(&client), pool(2), 1);

        let outcomes = dispatcher.process_all(&chunks(5)).await.unwrap();
        let indices: Vec<usize> = outcomes.iter().map(|o| o.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn single_credential_pool_tries_once_per_slice() {
        let client = Arc::new(MockClient::new(&[], &[0]));
        let dispatcher = ResilientDispatcher::new(Arc::clone(&client), pool(1), 4);

        let outcomes = dispatcher.process_all(&chunks(1)).await.unwrap();
        assert_eq!(client.calls_for(0).len(), 1);
        assert!(outcomes[0].is_exhausted());
    }
}
