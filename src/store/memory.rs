use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};
use uuid::Uuid;

use super::RuleStore;
use crate::core::{
    CategoryTaxRule, Region, RuleError, StoreError, TaxBracket, TaxExemption, TaxRule,
    ValidationError, validate_rule,
};

/// Partial update of a rule's header fields.
///
/// Fields left `None` are untouched. For the optional columns the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub region: Option<Option<Region>>,
    pub effective_date: Option<Option<NaiveDate>>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}

impl RuleUpdate {
    fn apply(self, rule: &mut TaxRule) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(region) = self.region {
            rule.region = region;
        }
        if let Some(date) = self.effective_date {
            rule.effective_date = date;
        }
        if let Some(date) = self.expiry_date {
            rule.expiry_date = date;
        }
        if let Some(active) = self.is_active {
            rule.is_active = active;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
    }
}

/// Process-local rule store.
///
/// Every write is validated before it becomes visible, so readers only ever
/// see rules that passed [`validate_rule`].
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: DashMap<Uuid, TaxRule>,
    organizations: DashMap<String, Region>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the region of an organization, used when a request has none.
    pub fn set_organization_region(&self, organization_id: impl Into<String>, region: Region) {
        self.organizations.insert(organization_id.into(), region);
    }

    /// Store a new rule, including any child records it already carries.
    pub fn create_rule(&self, rule: TaxRule) -> Result<TaxRule, StoreError> {
        ensure_valid(&rule)?;
        match self.rules.entry(rule.id) {
            Entry::Occupied(_) => Err(RuleError::Invalid(vec![ValidationError::new(
                "id",
                format!("rule {} already exists", rule.id),
            )])
            .into()),
            Entry::Vacant(slot) => {
                info!(
                    rule_id = %rule.id,
                    organization_id = %rule.organization_id,
                    rule_type = %rule.rule_type(),
                    "tax rule created"
                );
                slot.insert(rule.clone());
                Ok(rule)
            }
        }
    }

    pub fn get_rule(&self, id: Uuid) -> Result<TaxRule, StoreError> {
        self.rules
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::rule_not_found(id))
    }

    /// All rules of an organization, active or not, highest priority first.
    pub fn list_rules(&self, organization_id: &str) -> Vec<TaxRule> {
        self.collect(|r| r.organization_id == organization_id)
    }

    pub fn update_rule(&self, id: Uuid, update: RuleUpdate) -> Result<TaxRule, StoreError> {
        self.modify(id, |rule| {
            update.apply(rule);
            Ok(())
        })
    }

    /// Remove a rule together with its child records.
    pub fn delete_rule(&self, id: Uuid) -> Result<TaxRule, StoreError> {
        let (_, removed) = self
            .rules
            .remove(&id)
            .ok_or_else(|| StoreError::rule_not_found(id))?;
        info!(rule_id = %id, "tax rule deleted");
        Ok(removed)
    }

    pub fn attach_bracket(&self, rule_id: Uuid, bracket: TaxBracket) -> Result<TaxRule, StoreError> {
        self.modify(rule_id, |rule| rule.attach_bracket(bracket))
    }

    pub fn attach_exemption(
        &self,
        rule_id: Uuid,
        exemption: TaxExemption,
    ) -> Result<TaxRule, StoreError> {
        self.modify(rule_id, |rule| rule.attach_exemption(exemption))
    }

    pub fn attach_category_rule(
        &self,
        rule_id: Uuid,
        category_rule: CategoryTaxRule,
    ) -> Result<TaxRule, StoreError> {
        self.modify(rule_id, |rule| rule.attach_category_rule(category_rule))
    }

    /// Apply `change` to a copy of the rule and commit it only if the
    /// result is still valid. The entry stays locked until then.
    fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut TaxRule) -> Result<(), RuleError>,
    ) -> Result<TaxRule, StoreError> {
        let mut stored = self
            .rules
            .get_mut(&id)
            .ok_or_else(|| StoreError::rule_not_found(id))?;
        let mut candidate = stored.clone();
        change(&mut candidate)?;
        ensure_valid(&candidate)?;
        *stored = candidate.clone();
        debug!(rule_id = %id, "tax rule updated");
        Ok(candidate)
    }

    fn collect(&self, keep: impl Fn(&TaxRule) -> bool) -> Vec<TaxRule> {
        let mut rules: Vec<TaxRule> = self
            .rules
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        sort_by_precedence(&mut rules);
        rules
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn get_active_rules(
        &self,
        organization_id: &str,
        region: Region,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRule>, StoreError> {
        Ok(self.collect(|r| r.organization_id == organization_id && r.is_active_on(as_of, region)))
    }

    async fn organization_region(
        &self,
        organization_id: &str,
    ) -> Result<Option<Region>, StoreError> {
        Ok(self.organizations.get(organization_id).map(|r| *r.value()))
    }
}

fn ensure_valid(rule: &TaxRule) -> Result<(), RuleError> {
    let errors = validate_rule(rule);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RuleError::Invalid(errors))
    }
}

fn sort_by_precedence(rules: &mut [TaxRule]) {
    rules.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.created_at.cmp(&a.created_at))
    });
}
