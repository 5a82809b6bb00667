use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::*;

/// Validate a rule definition before it is stored.
/// Returns all validation errors found (not just the first).
///
/// Overlapping bracket ranges are accepted: the engine takes the first
/// ascending match, so overlap is a data-quality concern for administrators.
pub fn validate_rule(rule: &TaxRule) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if rule.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "rule name must not be empty"));
    }
    if rule.organization_id.trim().is_empty() {
        errors.push(ValidationError::new(
            "organization_id",
            "organization id must not be empty",
        ));
    }
    if let (Some(effective), Some(expiry)) = (rule.effective_date, rule.expiry_date) {
        if expiry < effective {
            errors.push(ValidationError::new(
                "expiry_date",
                format!("expiry date {expiry} is before effective date {effective}"),
            ));
        }
    }

    match &rule.config {
        RuleConfig::Bracket { brackets } => {
            for (i, bracket) in brackets.iter().enumerate() {
                validate_bracket(bracket, &format!("brackets[{i}]"), &mut errors);
            }
        }
        RuleConfig::Exemption { exemptions } => {
            for (i, exemption) in exemptions.iter().enumerate() {
                validate_exemption(exemption, &format!("exemptions[{i}]"), &mut errors);
            }
        }
        RuleConfig::Category { category_rules } => {
            for (i, category_rule) in category_rules.iter().enumerate() {
                validate_category_rule(category_rule, &format!("category_rules[{i}]"), &mut errors);
            }
        }
        RuleConfig::Threshold { settings } | RuleConfig::TimeBased { settings } => {
            if !(settings.is_object() || settings.is_null()) {
                errors.push(ValidationError::new(
                    "rule_config.settings",
                    "settings must be a JSON object",
                ));
            }
        }
    }

    errors
}

fn validate_bracket(
    bracket: &TaxBracket,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    if bracket.min_amount < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.min_amount"),
            "minimum amount must not be negative",
        ));
    }
    if let Some(max) = bracket.max_amount {
        if max < bracket.min_amount {
            errors.push(ValidationError::new(
                format!("{prefix}.max_amount"),
                format!(
                    "maximum amount {max} is below minimum amount {}",
                    bracket.min_amount
                ),
            ));
        }
    }
    validate_percentage(bracket.rate, &format!("{prefix}.rate"), errors);
}

fn validate_exemption(
    exemption: &TaxExemption,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(pct) = exemption.exemption_percentage {
        validate_percentage(pct, &format!("{prefix}.exemption_percentage"), errors);
    }
    if exemption.exemption_amount.is_some_and(|a| a < Decimal::ZERO) {
        errors.push(ValidationError::new(
            format!("{prefix}.exemption_amount"),
            "exemption amount must not be negative",
        ));
    }
    match exemption.exemption_type {
        ExemptionType::AmountThreshold if exemption.threshold_amount.is_none() => {
            errors.push(ValidationError::new(
                format!("{prefix}.threshold_amount"),
                "amount_threshold exemptions require a threshold amount",
            ));
        }
        ExemptionType::Category | ExemptionType::Full if !exemption.is_category_scoped() => {
            errors.push(ValidationError::new(
                format!("{prefix}.category_id"),
                "category exemptions require a category id or name",
            ));
        }
        _ => {}
    }
}

fn validate_category_rule(
    category_rule: &CategoryTaxRule,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    if category_rule.category_id.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.category_id"),
            "category id must not be empty",
        ));
    }
    validate_percentage(category_rule.rate, &format!("{prefix}.rate"), errors);
}

fn validate_percentage(value: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value < Decimal::ZERO || value > dec!(100) {
        errors.push(ValidationError::new(
            field,
            format!("{value} is outside the range 0–100"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExemptionBuilder, TaxRuleBuilder};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn valid_bracket_rule_passes() {
        let rule = TaxRuleBuilder::new("org-1", "Progressive", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), dec!(5)))
            .bracket(TaxBracket::new(dec!(1000), None, dec!(10)))
            .build_unchecked()
            .unwrap();
        assert!(validate_rule(&rule).is_empty());
    }

    #[test]
    fn overlapping_brackets_are_accepted() {
        let rule = TaxRuleBuilder::new("org-1", "Overlap", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), dec!(5)))
            .bracket(TaxBracket::new(dec!(500), Some(dec!(2000)), dec!(10)))
            .build_unchecked()
            .unwrap();
        assert!(validate_rule(&rule).is_empty());
    }

    #[test]
    fn inverted_bracket_and_bad_rate() {
        let rule = TaxRuleBuilder::new("org-1", "Broken", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(500), Some(dec!(100)), dec!(150)))
            .build_unchecked()
            .unwrap();
        let errors = validate_rule(&rule);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "brackets[0].max_amount");
        assert_eq!(errors[1].field, "brackets[0].rate");
    }

    #[test]
    fn expiry_before_effective() {
        let rule = TaxRuleBuilder::new("org-1", "Window", RuleConfig::brackets())
            .effective_from(date(2024, 6, 1))
            .expires_on(date(2024, 5, 31))
            .build_unchecked()
            .unwrap();
        let errors = validate_rule(&rule);
        assert!(errors.iter().any(|e| e.field == "expiry_date"));
    }

    #[test]
    fn empty_name_and_organization() {
        let rule = TaxRuleBuilder::new(" ", "", RuleConfig::exemptions())
            .build_unchecked()
            .unwrap();
        let fields: Vec<_> = validate_rule(&rule).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "organization_id"]);
    }

    #[test]
    fn threshold_exemption_requires_threshold() {
        let rule = TaxRuleBuilder::new("org-1", "Small purchases", RuleConfig::exemptions())
            .exemption(ExemptionBuilder::new(ExemptionType::AmountThreshold).build())
            .build_unchecked()
            .unwrap();
        let errors = validate_rule(&rule);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "exemptions[0].threshold_amount");
    }

    #[test]
    fn category_exemption_requires_category() {
        let rule = TaxRuleBuilder::new("org-1", "Unscoped", RuleConfig::exemptions())
            .exemption(ExemptionBuilder::new(ExemptionType::Full).build())
            .build_unchecked()
            .unwrap();
        assert_eq!(validate_rule(&rule)[0].field, "exemptions[0].category_id");
    }

    #[test]
    fn exemption_percentage_out_of_range() {
        let rule = TaxRuleBuilder::new("org-1", "Half", RuleConfig::exemptions())
            .exemption(
                ExemptionBuilder::new(ExemptionType::Partial)
                    .percentage(dec!(120))
                    .amount(dec!(-5))
                    .build(),
            )
            .build_unchecked()
            .unwrap();
        let fields: Vec<_> = validate_rule(&rule).into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "exemptions[0].exemption_percentage",
                "exemptions[0].exemption_amount"
            ]
        );
    }

    #[test]
    fn opaque_settings_must_be_object() {
        let rule = TaxRuleBuilder::new(
            "org-1",
            "Threshold",
            RuleConfig::Threshold {
                settings: serde_json::json!([1, 2]),
            },
        )
        .build_unchecked()
        .unwrap();
        assert_eq!(validate_rule(&rule)[0].field, "rule_config.settings");
    }
}
