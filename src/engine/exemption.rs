use rust_decimal::Decimal;
use tracing::debug;

use super::ActiveRules;
use super::arithmetic::rate_share;
use crate::core::{ExemptionEffect, ExemptionType, RuleType, TaxExemption, TaxRule};

/// Taxable base left after exemptions, with the trace of clauses that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemptionOutcome {
    pub taxable_amount: Decimal,
    pub applied: Vec<String>,
    /// A full exemption matched; nothing further is taxed.
    pub fully_exempt: bool,
}

impl ExemptionOutcome {
    /// Portion of `original_amount` removed by exemptions.
    pub fn exempted(&self, original_amount: Decimal) -> Decimal {
        original_amount.saturating_sub(self.taxable_amount)
    }
}

/// Reduce `amount` by every matching exemption clause of the active
/// exemption rules, in rule order.
///
/// A full exemption zeroes the base and stops evaluation. Percentage
/// exemptions are taken from the original amount, fixed ones are subtracted
/// as-is, and the result never drops below zero.
pub fn evaluate_exemptions(
    amount: Decimal,
    rules: &ActiveRules<'_>,
    category_id: Option<&str>,
    category_name: Option<&str>,
) -> ExemptionOutcome {
    let mut taxable = amount;
    let mut applied = Vec::new();

    for rule in rules.of_type(RuleType::Exemption) {
        for exemption in rule.exemptions() {
            if !matches(exemption, amount, category_id, category_name) {
                continue;
            }
            match exemption.effect() {
                ExemptionEffect::Full => {
                    debug!(rule = %rule.name, "full exemption matched");
                    applied.push(format!("Full exemption: {}", label(rule, exemption)));
                    return ExemptionOutcome {
                        taxable_amount: Decimal::ZERO,
                        applied,
                        fully_exempt: true,
                    };
                }
                ExemptionEffect::Percentage(pct) => {
                    let reduction = rate_share(amount, pct, Decimal::ONE_HUNDRED);
                    taxable = taxable.saturating_sub(reduction);
                    debug!(rule = %rule.name, percentage = %pct, "partial exemption matched");
                    applied.push(format!(
                        "Partial exemption: {}% ({})",
                        pct.normalize(),
                        label(rule, exemption)
                    ));
                }
                ExemptionEffect::Fixed(fixed) => {
                    taxable = taxable.saturating_sub(fixed);
                    debug!(rule = %rule.name, amount = %fixed, "fixed exemption matched");
                    applied.push(format!(
                        "Fixed exemption: {} ({})",
                        fixed.normalize(),
                        label(rule, exemption)
                    ));
                }
            }
        }
    }

    ExemptionOutcome {
        taxable_amount: taxable.max(Decimal::ZERO),
        applied,
        fully_exempt: false,
    }
}

fn matches(
    exemption: &TaxExemption,
    amount: Decimal,
    category_id: Option<&str>,
    category_name: Option<&str>,
) -> bool {
    match exemption.exemption_type {
        ExemptionType::Full | ExemptionType::Category => {
            category_matches(exemption, category_id, category_name)
        }
        ExemptionType::AmountThreshold => exemption
            .threshold_amount
            .is_some_and(|threshold| amount <= threshold),
        ExemptionType::Partial => {
            !exemption.is_category_scoped()
                || category_matches(exemption, category_id, category_name)
        }
        ExemptionType::Product | ExemptionType::Vendor => false,
    }
}

fn category_matches(
    exemption: &TaxExemption,
    category_id: Option<&str>,
    category_name: Option<&str>,
) -> bool {
    let by_id = matches!(
        (exemption.category_id.as_deref(), category_id),
        (Some(a), Some(b)) if a == b
    );
    let by_name = matches!(
        (exemption.category_name.as_deref(), category_name),
        (Some(a), Some(b)) if a == b
    );
    by_id || by_name
}

fn label<'a>(rule: &'a TaxRule, exemption: &'a TaxExemption) -> &'a str {
    if exemption.description.trim().is_empty() {
        &rule.name
    } else {
        &exemption.description
    }
}
