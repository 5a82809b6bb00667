use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::trace;

use super::RuleStore;
use crate::core::{Region, StoreError, TaxRule};

type CacheKey = (String, Region, NaiveDate);

struct CachedRules {
    rules: Vec<TaxRule>,
    fetched_at: Instant,
}

/// Caches the active rule sets of another store for a fixed time.
///
/// Errors from the inner store are passed through and never cached.
/// Writers must call [`CachedRuleStore::invalidate`] after changing an
/// organization's rules, or accept up to `ttl` of staleness.
pub struct CachedRuleStore<S> {
    inner: S,
    ttl: Duration,
    entries: DashMap<CacheKey, CachedRules>,
}

impl<S: RuleStore> CachedRuleStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached rule set of `organization_id`.
    pub fn invalidate(&self, organization_id: &str) {
        self.entries.retain(|(org, _, _), _| org != organization_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached rule sets. Expired ones are dropped on the next miss.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<TaxRule>> {
        let entry = self.entries.get(key)?;
        self.is_fresh(&entry).then(|| entry.rules.clone())
    }

    fn is_fresh(&self, entry: &CachedRules) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    fn prune(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry));
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            trace!(dropped, "expired rule sets dropped");
        }
    }
}

#[async_trait]
impl<S: RuleStore> RuleStore for CachedRuleStore<S> {
    async fn get_active_rules(
        &self,
        organization_id: &str,
        region: Region,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRule>, StoreError> {
        let key = (organization_id.to_string(), region, as_of);
        if let Some(rules) = self.lookup(&key) {
            trace!(organization_id, %region, %as_of, "rule cache hit");
            return Ok(rules);
        }

        trace!(organization_id, %region, %as_of, "rule cache miss");
        let rules = self
            .inner
            .get_active_rules(organization_id, region, as_of)
            .await?;
        self.prune();
        self.entries.insert(
            key,
            CachedRules {
                rules: rules.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(rules)
    }

    async fn organization_region(
        &self,
        organization_id: &str,
    ) -> Result<Option<Region>, StoreError> {
        self.inner.organization_region(organization_id).await
    }
}
