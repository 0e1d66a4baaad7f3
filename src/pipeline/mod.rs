pub mod fanout;
pub mod pagination;
pub mod ranking;

use crate::cache::{normalize_term, CacheKey, ResultCache};
use crate::errors::{MediaRankError, Result};
use crate::providers::Provider;
use crate::utils::logger::Logger;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub use fanout::FanOut;
pub use pagination::{Page, PageWalker, Paging};
pub use ranking::Ranked;

/// Parent metadata plus its ranked children, highest score first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<P, I> {
    pub parent: P,
    pub items: Vec<I>,
}

/// One search domain: resolve a term, enrich its children, score and sort them
#[async_trait]
pub trait RankingPipeline: Send + Sync {
    type Parent: Serialize + DeserializeOwned + Send;
    type Item: Ranked + Serialize + DeserializeOwned + Send;

    fn provider(&self) -> Provider;

    /// Build a fresh result with no lookup of the whole-result cache
    async fn compute(&self, term: &str) -> Result<SearchResult<Self::Parent, Self::Item>>;
}

/// Cache-or-compute wrapper around a [`RankingPipeline`]
#[derive(Clone)]
pub struct CacheGate {
    cache: Arc<ResultCache>,
}

impl CacheGate {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Return the cached result for `term`, or compute, store and return it
    pub async fn run<P: RankingPipeline>(
        &self,
        pipeline: &P,
        term: &str,
    ) -> Result<SearchResult<P::Parent, P::Item>> {
        let key = search_key(pipeline.provider(), term)?;

        if let Some(cached) = self.cache.get(&key)? {
            info!("Serving {} results for '{}' from cache", pipeline.provider(), term.trim());
            return Ok(cached);
        }

        let operation = format!("{} search '{}'", pipeline.provider(), term.trim());
        Logger::log_operation_start(&operation);
        let result = pipeline.compute(term.trim()).await?;
        self.cache.put(&key, &result)?;
        Logger::log_operation_complete(&operation);
        Ok(result)
    }

    /// Drop the cached result for `term` so the next run recomputes it
    pub fn invalidate(&self, provider: Provider, term: &str) -> Result<bool> {
        let key = search_key(provider, term)?;
        self.cache.invalidate(&key)
    }
}

fn search_key(provider: Provider, term: &str) -> Result<CacheKey> {
    if normalize_term(term).is_empty() {
        return Err(MediaRankError::InvalidInput(
            "Search term must not be empty".to_string(),
        ));
    }
    Ok(CacheKey::search(provider, term))
}
