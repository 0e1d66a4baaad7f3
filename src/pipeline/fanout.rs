use crate::cache::{CacheKey, ResultCache};
use crate::errors::{MediaRankError, Result};
use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Bounded-concurrency detail lookups.
///
/// Calls run at most `concurrency` at a time. The first failing call fails
/// the whole enrichment and the remaining in-flight calls are dropped.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    concurrency: usize,
}

impl FanOut {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Split `ids` into consecutive batches of at most `batch_size`, fetch each
    /// batch once, and attach the returned records to the ids they name.
    ///
    /// Records are matched through `id_of`, never by position, so providers
    /// may reorder or omit entries. Records for ids outside the batch are ignored.
    pub async fn batched<I, D, F, Fut, K>(
        &self,
        ids: &[I],
        batch_size: usize,
        fetch: F,
        id_of: K,
    ) -> Result<HashMap<I, D>>
    where
        I: Clone + Eq + Hash + std::fmt::Debug,
        F: Fn(Vec<I>) -> Fut,
        Fut: Future<Output = Result<Vec<D>>>,
        K: Fn(&D) -> I,
    {
        let permits = Semaphore::new(self.concurrency);
        let permits = &permits;
        let fetch = &fetch;

        let calls = ids.chunks(batch_size.max(1)).map(|chunk| {
            let batch = chunk.to_vec();
            async move {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|e| MediaRankError::InvalidInput(format!("Fan-out closed: {}", e)))?;
                let records = fetch(batch.clone()).await?;
                Ok::<_, MediaRankError>((batch, records))
            }
        });
        let responses = try_join_all(calls).await?;
        debug!(
            "Fetched {} batches for {} ids",
            responses.len(),
            ids.len()
        );

        let mut details = HashMap::with_capacity(ids.len());
        for (batch, records) in responses {
            let requested: HashSet<&I> = batch.iter().collect();
            for record in records {
                let id = id_of(&record);
                if requested.contains(&id) {
                    details.insert(id, record);
                } else {
                    warn!("Ignoring record for unrequested id {:?}", id);
                }
            }
        }
        Ok(details)
    }

    /// One lookup per id, each consulting `cache` first. Fetched records are
    /// written back under `key_for(id)`. A fetch returning `None` leaves the id
    /// out of the result and is not cached.
    pub async fn each_cached<I, D, F, Fut, K>(
        &self,
        ids: &[I],
        cache: &ResultCache,
        key_for: K,
        fetch: F,
    ) -> Result<HashMap<I, D>>
    where
        I: Clone + Eq + Hash,
        D: Serialize + DeserializeOwned,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<Option<D>>>,
        K: Fn(&I) -> CacheKey,
    {
        let permits = Semaphore::new(self.concurrency);
        let permits = &permits;
        let fetch = &fetch;
        let key_for = &key_for;

        let lookups = ids.iter().cloned().map(|id| async move {
            let key = key_for(&id);
            if let Some(hit) = cache.get::<D>(&key)? {
                return Ok::<_, MediaRankError>((id, Some(hit)));
            }

            let _permit = permits
                .acquire()
                .await
                .map_err(|e| MediaRankError::InvalidInput(format!("Fan-out closed: {}", e)))?;
            let fetched = fetch(id.clone()).await?;
            if let Some(detail) = &fetched {
                cache.put(&key, detail)?;
            }
            Ok((id, fetched))
        });

        let results = try_join_all(lookups).await?;
        Ok(results
            .into_iter()
            .filter_map(|(id, detail)| detail.map(|d| (id, d)))
            .collect())
    }
}
