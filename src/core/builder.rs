use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::RuleError;
use super::types::*;
use super::validation;

/// Builder for constructing tax rules.
///
/// ```
/// use taxrule::core::*;
/// use rust_decimal_macros::dec;
///
/// let rule = TaxRuleBuilder::new("org-1", "Progressive VAT", RuleConfig::brackets())
///     .region(Region::Uae)
///     .priority(10)
///     .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), dec!(5)))
///     .bracket(TaxBracket::new(dec!(1000), None, dec!(10)))
///     .build()
///     .unwrap();
/// assert_eq!(rule.brackets().len(), 2);
/// assert!(rule.brackets().iter().all(|b| b.rule_id == rule.id));
/// ```
pub struct TaxRuleBuilder {
    id: Option<Uuid>,
    organization_id: String,
    region: Option<Region>,
    name: String,
    config: RuleConfig,
    effective_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    is_active: bool,
    priority: i32,
    created_at: Option<DateTime<Utc>>,
    brackets: Vec<TaxBracket>,
    exemptions: Vec<TaxExemption>,
    category_rules: Vec<CategoryTaxRule>,
}

impl TaxRuleBuilder {
    pub fn new(
        organization_id: impl Into<String>,
        name: impl Into<String>,
        config: RuleConfig,
    ) -> Self {
        Self {
            id: None,
            organization_id: organization_id.into(),
            region: None,
            name: name.into(),
            config,
            effective_date: None,
            expiry_date: None,
            is_active: true,
            priority: 0,
            created_at: None,
            brackets: Vec::new(),
            exemptions: Vec::new(),
            category_rules: Vec::new(),
        }
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn effective_from(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }

    pub fn expires_on(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn bracket(mut self, bracket: TaxBracket) -> Self {
        self.brackets.push(bracket);
        self
    }

    pub fn exemption(mut self, exemption: TaxExemption) -> Self {
        self.exemptions.push(exemption);
        self
    }

    pub fn category_rule(mut self, category_rule: CategoryTaxRule) -> Self {
        self.category_rules.push(category_rule);
        self
    }

    /// Build the rule and run validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<TaxRule, RuleError> {
        let rule = self.build_unchecked()?;
        let errors = validation::validate_rule(&rule);
        if !errors.is_empty() {
            return Err(RuleError::Invalid(errors));
        }
        Ok(rule)
    }

    /// Build without validation, for tests or imported data.
    /// Child records added to a rule of another type are still rejected.
    pub fn build_unchecked(self) -> Result<TaxRule, RuleError> {
        let mut rule = TaxRule {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            organization_id: self.organization_id,
            region: self.region,
            name: self.name,
            config: self.config,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            priority: self.priority,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        };
        for bracket in self.brackets {
            rule.attach_bracket(bracket)?;
        }
        for exemption in self.exemptions {
            rule.attach_exemption(exemption)?;
        }
        for category_rule in self.category_rules {
            rule.attach_category_rule(category_rule)?;
        }
        Ok(rule)
    }
}

impl TaxRule {
    fn mismatch(&self, expected: RuleType) -> RuleError {
        RuleError::TypeMismatch {
            rule_id: self.id,
            expected,
            actual: self.rule_type(),
        }
    }

    /// Add a bracket to a bracket rule, taking ownership of it.
    pub fn attach_bracket(&mut self, mut bracket: TaxBracket) -> Result<(), RuleError> {
        let id = self.id;
        match &mut self.config {
            RuleConfig::Bracket { brackets } => {
                bracket.rule_id = id;
                brackets.push(bracket);
                Ok(())
            }
            _ => Err(self.mismatch(RuleType::Bracket)),
        }
    }

    /// Add an exemption clause to an exemption rule, taking ownership of it.
    pub fn attach_exemption(&mut self, mut exemption: TaxExemption) -> Result<(), RuleError> {
        let id = self.id;
        match &mut self.config {
            RuleConfig::Exemption { exemptions } => {
                exemption.rule_id = id;
                exemptions.push(exemption);
                Ok(())
            }
            _ => Err(self.mismatch(RuleType::Exemption)),
        }
    }

    /// Add a category rate to a category rule, taking ownership of it.
    pub fn attach_category_rule(
        &mut self,
        mut category_rule: CategoryTaxRule,
    ) -> Result<(), RuleError> {
        let id = self.id;
        match &mut self.config {
            RuleConfig::Category { category_rules } => {
                category_rule.rule_id = id;
                category_rules.push(category_rule);
                Ok(())
            }
            _ => Err(self.mismatch(RuleType::Category)),
        }
    }
}

/// Builder for exemption clauses.
pub struct ExemptionBuilder {
    exemption_type: ExemptionType,
    category_id: Option<String>,
    category_name: Option<String>,
    exemption_amount: Option<Decimal>,
    exemption_percentage: Option<Decimal>,
    threshold_amount: Option<Decimal>,
    description: String,
}

impl ExemptionBuilder {
    pub fn new(exemption_type: ExemptionType) -> Self {
        Self {
            exemption_type,
            category_id: None,
            category_name: None,
            exemption_amount: None,
            exemption_percentage: None,
            threshold_amount: None,
            description: String::new(),
        }
    }

    pub fn category_id(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }

    pub fn category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    /// Fixed amount removed from the base.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.exemption_amount = Some(amount);
        self
    }

    /// Percentage of the original amount removed from the base.
    pub fn percentage(mut self, percentage: Decimal) -> Self {
        self.exemption_percentage = Some(percentage);
        self
    }

    pub fn threshold(mut self, threshold: Decimal) -> Self {
        self.threshold_amount = Some(threshold);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn build(self) -> TaxExemption {
        TaxExemption {
            rule_id: Uuid::nil(),
            exemption_type: self.exemption_type,
            category_id: self.category_id,
            category_name: self.category_name,
            exemption_amount: self.exemption_amount,
            exemption_percentage: self.exemption_percentage,
            threshold_amount: self.threshold_amount,
            description: self.description,
        }
    }
}
