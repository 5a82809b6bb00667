//! Rule stores: where the engine reads tax rule definitions from.
//!
//! [`RuleStore`] is the read contract the engine depends on.
//! [`InMemoryRuleStore`] implements it together with the administrative
//! create/update/delete/attach operations, and, with the `cache` feature,
//! [`CachedRuleStore`] wraps any store with a short-lived cache.

#[cfg(feature = "cache")]
mod cache;
mod memory;

#[cfg(feature = "cache")]
pub use cache::CachedRuleStore;
pub use memory::{InMemoryRuleStore, RuleUpdate};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::{Region, StoreError, TaxRule};

/// Read-only source of tax rules for the engine.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Rules of `organization_id` active in `region` on `as_of`, with their
    /// brackets, exemptions and category rates attached.
    ///
    /// A rule is active when `is_active` is set, `as_of` falls inside its
    /// effective/expiry window (both inclusive, either may be open) and its
    /// region is unset or equal to `region`. Results are ordered highest
    /// priority first, then most recently created first. No matching rules
    /// is an empty list, not an error.
    async fn get_active_rules(
        &self,
        organization_id: &str,
        region: Region,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRule>, StoreError>;

    /// Region recorded on the organization, if any.
    async fn organization_region(
        &self,
        _organization_id: &str,
    ) -> Result<Option<Region>, StoreError> {
        Ok(None)
    }
}

#[async_trait]
impl<S: RuleStore + ?Sized> RuleStore for Arc<S> {
    async fn get_active_rules(
        &self,
        organization_id: &str,
        region: Region,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRule>, StoreError> {
        (**self)
            .get_active_rules(organization_id, region, as_of)
            .await
    }

    async fn organization_region(
        &self,
        organization_id: &str,
    ) -> Result<Option<Region>, StoreError> {
        (**self).organization_region(organization_id).await
    }
}
