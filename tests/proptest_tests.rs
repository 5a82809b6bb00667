//! Property-based tests for the calculation engine.
//!
//! Run with: `cargo test --test proptest_tests`

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use taxrule::core::*;
use taxrule::engine::TaxEngine;
use taxrule::store::InMemoryRuleStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine() -> TaxEngine<InMemoryRuleStore> {
    TaxEngine::new(InMemoryRuleStore::new())
}

fn request(amount: Decimal) -> TaxCalculationRequest {
    TaxCalculationRequest::new(amount, "org-prop").on(date(2024, 6, 1))
}

/// Mixed rule set: a bracket rule, a category rule for "fuel" and a
/// partial exemption for "food".
fn mixed_rules(bracket_rate: Decimal, category_rate: Decimal) -> Vec<TaxRule> {
    vec![
        TaxRuleBuilder::new("org-prop", "Brackets", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), bracket_rate))
            .bracket(TaxBracket::new(dec!(1000.01), None, dec!(20)))
            .build()
            .unwrap(),
        TaxRuleBuilder::new("org-prop", "Categories", RuleConfig::category_rules())
            .category_rule(CategoryTaxRule::new("fuel", category_rate))
            .build()
            .unwrap(),
        TaxRuleBuilder::new("org-prop", "Food relief", RuleConfig::exemptions())
            .exemption(
                ExemptionBuilder::new(ExemptionType::Partial)
                    .category_id("food")
                    .percentage(dec!(25))
                    .build(),
            )
            .build()
            .unwrap(),
    ]
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Generate an amount (0.00 to 9,999,999.99).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Generate a rate in percent with up to two decimals (0 to 100).
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0u32..=10_000u32).prop_map(|bp| Decimal::new(i64::from(bp), 2))
}

/// Generate any representable decimal, including the extremes.
fn arb_any_decimal() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::MAX),
        Just(Decimal::MIN),
        (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28).prop_map(
            |(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale)
        ),
    ]
}

fn arb_region() -> impl Strategy<Value = Region> {
    prop::sample::select(Region::ALL.to_vec())
}

fn arb_category() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("fuel")), Just(Some("food")), Just(Some("other"))]
}

fn arb_method() -> impl Strategy<Value = CalculationMethod> {
    prop_oneof![
        Just(CalculationMethod::Inclusive),
        Just(CalculationMethod::Exclusive)
    ]
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Inclusive results always add back up to the amount.
    #[test]
    fn inclusive_reconciles(
        amount in arb_amount(),
        region in arb_region(),
        bracket_rate in arb_rate(),
        category_rate in arb_rate(),
        category in arb_category(),
    ) {
        let mut req = request(amount).method(CalculationMethod::Inclusive);
        if let Some(category) = category {
            req = req.category_id(category);
        }
        let rules = mixed_rules(bracket_rate, category_rate);
        let result = engine().calculate_with_rules(&req, region, &rules);
        let exempted = result
            .breakdown
            .as_ref()
            .and_then(|b| b.exemption_amount)
            .unwrap_or_default();
        prop_assert_eq!(result.base_amount + result.vat_amount + exempted, amount);
    }

    /// VAT is never negative and never exceeds the amount for rates up to 100%.
    #[test]
    fn vat_is_bounded(
        amount in arb_amount(),
        rate in arb_rate(),
        method in arb_method(),
    ) {
        let req = request(amount).tax_rate(rate).method(method);
        let result = engine().calculate_with_rules(&req, Region::Uae, &[]);
        prop_assert!(result.vat_amount >= Decimal::ZERO);
        prop_assert!(result.vat_amount <= amount);
        prop_assert!(result.vat_amount.scale() <= 2);
    }

    /// Untaxed types ignore every configured rule and override.
    #[test]
    fn untaxed_types_are_never_taxed(
        amount in arb_amount(),
        rate in arb_rate(),
        category in arb_category(),
        zero_rated in any::<bool>(),
    ) {
        let tax_type = if zero_rated { VatTaxType::ZeroRated } else { VatTaxType::Exempt };
        let mut req = request(amount).tax_rate(rate).vat_tax_type(tax_type);
        if let Some(category) = category {
            req = req.category_id(category);
        }
        let rules = mixed_rules(dec!(10), dec!(15));
        let result = engine().calculate_with_rules(&req, Region::SaudiArabia, &rules);
        prop_assert_eq!(result.vat_amount, Decimal::ZERO);
        prop_assert_eq!(result.base_amount, amount);
    }

    /// A matching full exemption zeroes VAT whatever else is configured.
    #[test]
    fn full_exemption_wins(amount in arb_amount(), rate in arb_rate()) {
        let mut rules = mixed_rules(dec!(10), dec!(15));
        rules.push(
            TaxRuleBuilder::new("org-prop", "Fuel exempt", RuleConfig::exemptions())
                .exemption(ExemptionBuilder::new(ExemptionType::Full).category_id("fuel").build())
                .build()
                .unwrap(),
        );
        let req = request(amount).category_id("fuel").tax_rate(rate);
        let result = engine().calculate_with_rules(&req, Region::Uae, &rules);
        prop_assert_eq!(result.vat_amount, Decimal::ZERO);
        prop_assert_eq!(result.base_amount, amount);
        prop_assert_eq!(result.effective_tax_rate, Decimal::ZERO);
    }

    /// The manual rate is applied verbatim over every other source.
    #[test]
    fn manual_rate_wins(
        amount in arb_amount(),
        rate in arb_rate(),
        category in arb_category(),
        region in arb_region(),
    ) {
        let mut req = request(amount).tax_rate(rate);
        if let Some(category) = category {
            req = req.category_id(category);
        }
        let rules = mixed_rules(dec!(10), dec!(15));
        let result = engine().calculate_with_rules(&req, region, &rules);
        prop_assert_eq!(result.effective_tax_rate, rate);
        prop_assert!(result.applied_rules.contains(&"manual tax rate override".to_string()));
    }

    /// Without an override, the category rate beats the bracket rate.
    #[test]
    fn category_beats_bracket(
        amount in arb_amount(),
        bracket_rate in arb_rate(),
        category_rate in arb_rate(),
    ) {
        let req = request(amount).category_id("fuel");
        let rules = mixed_rules(bracket_rate, category_rate);
        let result = engine().calculate_with_rules(&req, Region::Uae, &rules);
        prop_assert_eq!(result.effective_tax_rate, category_rate);
    }

    /// Reverse charge keeps the base at the taxable amount.
    #[test]
    fn reverse_charge_keeps_base(
        amount in arb_amount(),
        method in arb_method(),
        region in arb_region(),
    ) {
        let req = request(amount).vat_tax_type(VatTaxType::ReverseCharge).method(method);
        let result = engine().calculate_with_rules(&req, region, &[]);
        prop_assert!(result.is_reverse_charge);
        prop_assert_eq!(result.base_amount, amount);
        prop_assert_eq!(
            result.vat_amount,
            RoundingMode::HalfUp.round_money(amount * region.standard_rate() / dec!(100))
        );
    }

    /// Any amount with any manual rate yields a result with VAT in cents.
    #[test]
    fn calculation_is_total(
        amount in arb_any_decimal(),
        rate in prop::option::of(arb_any_decimal()),
        method in arb_method(),
        reverse_charge in any::<bool>(),
        category in arb_category(),
    ) {
        let mut req = request(amount).method(method);
        if let Some(rate) = rate {
            req = req.tax_rate(rate);
        }
        if reverse_charge {
            req = req.vat_tax_type(VatTaxType::ReverseCharge);
        }
        if let Some(category) = category {
            req = req.category_id(category);
        }
        let rules = mixed_rules(dec!(10), dec!(15));
        let result = engine().calculate_with_rules(&req, Region::Uae, &rules);
        prop_assert!(result.vat_amount.scale() <= 2);
    }
}
